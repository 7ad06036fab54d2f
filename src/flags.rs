//! Modifier applicability flags.
//!
//! `ModFlags` restrict a modifier to a kind of damage instance (attack hits,
//! melee, area, weapon types); `KeywordFlags` restrict it to skill keywords
//! (aura, curse, fire, minion...). A modifier with empty flags applies
//! everywhere; otherwise every one of its bits must be present in the
//! query. Both are 64 bits wide.

use bitflags::bitflags;

bitflags! {
    /// Damage-instance flags carried by a modifier or a query.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct ModFlags: u64 {
        const ATTACK            = 1 << 0;
        const SPELL             = 1 << 1;
        const HIT               = 1 << 2;
        const DOT               = 1 << 3;
        const CAST              = 1 << 4;
        const MELEE             = 1 << 5;
        const AREA              = 1 << 6;
        const PROJECTILE        = 1 << 7;
        const AILMENT           = 1 << 8;
        const MELEE_HIT         = 1 << 9;
        const WEAPON            = 1 << 10;
        const AXE               = 1 << 16;
        const BOW               = 1 << 17;
        const CLAW              = 1 << 18;
        const DAGGER            = 1 << 19;
        const MACE              = 1 << 20;
        const STAFF             = 1 << 21;
        const SWORD             = 1 << 22;
        const WAND              = 1 << 23;
        const UNARMED           = 1 << 24;
        const WEAPON_ONE_HAND   = 1 << 28;
        const WEAPON_TWO_HAND   = 1 << 29;
        const WEAPON_RANGED     = 1 << 30;
        const SHIELD            = 1 << 32;
        const DUAL_WIELD        = 1 << 33;
    }
}

bitflags! {
    /// Skill keyword flags carried by a modifier or a query.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    #[derive(serde::Serialize, serde::Deserialize)]
    pub struct KeywordFlags: u64 {
        const AURA      = 1 << 0;
        const CURSE     = 1 << 1;
        const WARCRY    = 1 << 2;
        const MOVEMENT  = 1 << 3;
        const PHYSICAL  = 1 << 4;
        const FIRE      = 1 << 5;
        const COLD      = 1 << 6;
        const LIGHTNING = 1 << 7;
        const CHAOS     = 1 << 8;
        const VAAL      = 1 << 9;
        const BOW       = 1 << 10;
        const TRAP      = 1 << 11;
        const MINE      = 1 << 12;
        const TOTEM     = 1 << 13;
        const MINION    = 1 << 14;
        const ATTACK    = 1 << 16;
        const SPELL     = 1 << 17;
        const HIT       = 1 << 18;
        const AILMENT   = 1 << 19;
        const BRAND     = 1 << 20;
        const POISON    = 1 << 21;
        const BLEED     = 1 << 22;
        const IGNITE    = 1 << 23;
        const ARCANE    = 1 << 24;
        const HEX       = 1 << 40;
        const MARK      = 1 << 41;
    }
}

impl ModFlags {
    /// True when a modifier carrying `self` applies to a query with `query`.
    pub fn applies_to(self, query: ModFlags) -> bool {
        self.is_empty() || query.contains(self)
    }

    /// Parse a list of flag names as found in table files.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        names.into_iter().try_fold(Self::empty(), |acc, name| {
            Self::from_name(name)
                .map(|f| acc | f)
                .ok_or_else(|| name.to_string())
        })
    }
}

impl KeywordFlags {
    /// True when a modifier carrying `self` applies to a query with `query`.
    pub fn applies_to(self, query: KeywordFlags) -> bool {
        self.is_empty() || query.contains(self)
    }

    /// Parse a list of keyword names as found in table files.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        names.into_iter().try_fold(Self::empty(), |acc, name| {
            Self::from_name(name)
                .map(|f| acc | f)
                .ok_or_else(|| name.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_flags_apply_everywhere() {
        assert!(ModFlags::empty().applies_to(ModFlags::empty()));
        assert!(ModFlags::empty().applies_to(ModFlags::SPELL));
        assert!(KeywordFlags::empty().applies_to(KeywordFlags::FIRE));
    }

    #[test]
    fn test_subset_rule() {
        let melee_attack = ModFlags::ATTACK | ModFlags::MELEE;
        assert!(ModFlags::ATTACK.applies_to(melee_attack));
        assert!(melee_attack.applies_to(melee_attack | ModFlags::HIT));
        assert!(!melee_attack.applies_to(ModFlags::ATTACK));
        assert!(!ModFlags::SPELL.applies_to(ModFlags::empty()));
    }

    #[test]
    fn test_high_bits_survive() {
        let hex = KeywordFlags::HEX | KeywordFlags::MARK;
        assert_eq!(hex.bits(), (1u64 << 40) | (1u64 << 41));
        assert!(ModFlags::DUAL_WIELD.bits() > u32::MAX as u64);
    }

    #[test]
    fn test_from_names() {
        let flags = ModFlags::from_names(["ATTACK", "MELEE"]).unwrap();
        assert_eq!(flags, ModFlags::ATTACK | ModFlags::MELEE);
        assert_eq!(KeywordFlags::from_names(["NOPE"]), Err("NOPE".to_string()));
    }
}
