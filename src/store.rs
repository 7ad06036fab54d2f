//! Modifier store.
//!
//! `ModDb` holds the modifiers for one actor in insertion order and answers
//! the aggregation queries the resolver is built on. A per-stat index keeps
//! queries proportional to the number of modifiers on the queried stat.

use crate::context::QueryContext;
use crate::flags::{KeywordFlags, ModFlags};
use crate::modifier::{Mod, ModKind, ModValue, SourceCategory};
use crate::stat_id::StatId;
use std::collections::HashMap;

/// An append-ordered modifier collection with aggregation queries.
///
/// # Examples
///
/// ```rust
/// use modcalc::{Mod, ModDb, ModKind, ModSource, QueryContext, SourceCategory};
///
/// let src = ModSource::new(SourceCategory::Item);
/// let mut db = ModDb::new();
/// db.add(Mod::new("Life", ModKind::Base, 50.0, src.clone()));
/// db.add(Mod::new("Life", ModKind::Base, 30.0, src.clone()));
/// db.add(Mod::new("Life", ModKind::More, 0.2, src));
///
/// let ctx = QueryContext::new();
/// assert_eq!(db.sum(ModKind::Base, &"Life".into(), &ctx), 80.0);
/// assert!((db.more(&"Life".into(), &ctx) - 1.2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModDb {
    mods: Vec<Mod>,
    index: HashMap<StatId, Vec<usize>>,
}

impl ModDb {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store by copying the given stores in order.
    ///
    /// Cost is linear in the total number of modifiers.
    pub fn compose<'a>(parts: impl IntoIterator<Item = &'a ModDb>) -> Self {
        let parts: Vec<&ModDb> = parts.into_iter().collect();
        let total = parts.iter().map(|p| p.len()).sum();
        let mut db = Self {
            mods: Vec::with_capacity(total),
            index: HashMap::new(),
        };
        for part in parts {
            db.merge(part);
        }
        db
    }

    /// Append one modifier.
    pub fn add(&mut self, m: Mod) {
        self.index
            .entry(m.name.clone())
            .or_default()
            .push(self.mods.len());
        self.mods.push(m);
    }

    /// Append many modifiers, preserving their order.
    pub fn add_all(&mut self, mods: impl IntoIterator<Item = Mod>) {
        for m in mods {
            self.add(m);
        }
    }

    /// Append an independent copy of every modifier in `other`.
    pub fn merge(&mut self, other: &ModDb) {
        self.mods.reserve(other.mods.len());
        for m in &other.mods {
            self.add(m.clone());
        }
    }

    /// Remove every modifier from `category` (and instance `id`, if given).
    /// Returns how many were removed.
    pub fn remove_by_source(&mut self, category: SourceCategory, id: Option<&str>) -> usize {
        let before = self.mods.len();
        self.mods.retain(|m| !m.source.matches(category, id));
        let removed = before - self.mods.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, m) in self.mods.iter().enumerate() {
            self.index.entry(m.name.clone()).or_default().push(i);
        }
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// All modifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter()
    }

    pub fn by_kind(&self, kind: ModKind) -> Vec<&Mod> {
        self.mods.iter().filter(|m| m.kind == kind).collect()
    }

    pub fn by_name(&self, name: &StatId) -> Vec<&Mod> {
        self.mods_for(name)
    }

    pub fn by_source(&self, category: SourceCategory, id: Option<&str>) -> Vec<&Mod> {
        self.mods
            .iter()
            .filter(|m| m.source.matches(category, id))
            .collect()
    }

    /// Modifiers that would apply to a query carrying `flags`.
    pub fn with_flags(&self, flags: ModFlags) -> Vec<&Mod> {
        self.mods
            .iter()
            .filter(|m| m.flags.applies_to(flags))
            .collect()
    }

    /// Modifiers that would apply to a query carrying `keyword_flags`.
    pub fn with_keyword_flags(&self, keyword_flags: KeywordFlags) -> Vec<&Mod> {
        self.mods
            .iter()
            .filter(|m| m.keyword_flags.applies_to(keyword_flags))
            .collect()
    }

    /// Every modifier on `name`, in insertion order.
    pub fn mods_for(&self, name: &StatId) -> Vec<&Mod> {
        self.index
            .get(name)
            .map(|idx| idx.iter().map(|&i| &self.mods[i]).collect())
            .unwrap_or_default()
    }

    /// Names of all stats with at least one modifier, sorted.
    pub fn stat_names(&self) -> Vec<&StatId> {
        let mut names: Vec<&StatId> = self.index.keys().collect();
        names.sort();
        names
    }

    pub fn has_stat(&self, name: &StatId) -> bool {
        self.index.contains_key(name)
    }

    pub fn has_mod(&self, kind: ModKind, name: &StatId) -> bool {
        self.index
            .get(name)
            .is_some_and(|idx| idx.iter().any(|&i| self.mods[i].kind == kind))
    }

    /// Matching modifiers of `kind` on `stat`, paired with their effective
    /// values.
    pub fn matching(&self, kind: ModKind, stat: &StatId, ctx: &QueryContext) -> Vec<(&Mod, f64)> {
        let Some(idx) = self.index.get(stat) else {
            return Vec::new();
        };
        idx.iter()
            .map(|&i| &self.mods[i])
            .filter(|m| m.kind == kind)
            .filter_map(|m| m.applies(ctx).map(|v| (m, v)))
            .collect()
    }

    /// Sum of matching BASE or INC values.
    ///
    /// Other kinds do not add up and sum to `0.0`; use [`ModDb::more`],
    /// [`ModDb::override_value`], [`ModDb::flag`] or [`ModDb::list`].
    ///
    /// # Arguments
    ///
    /// * `kind` - `ModKind::Base` or `ModKind::Inc`
    /// * `stat` - The stat to sum
    /// * `ctx` - Flags, conditions and known stat values of the query
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcalc::*;
    ///
    /// let src = ModSource::new(SourceCategory::Item);
    /// let mut db = ModDb::new();
    /// db.add(Mod::new("Damage", ModKind::Inc, 0.2, src.clone()));
    /// db.add(Mod::new("Damage", ModKind::Inc, 0.3, src.clone()).with_flags(ModFlags::ATTACK));
    /// db.add(Mod::new("Damage", ModKind::More, 0.5, src));
    ///
    /// let damage = StatId::new("Damage");
    /// let attack = QueryContext::new().with_flags(ModFlags::ATTACK);
    /// assert!((db.sum(ModKind::Inc, &damage, &QueryContext::new()) - 0.2).abs() < 1e-9);
    /// assert!((db.sum(ModKind::Inc, &damage, &attack) - 0.5).abs() < 1e-9);
    /// assert_eq!(db.sum(ModKind::More, &damage, &attack), 0.0);
    /// ```
    pub fn sum(&self, kind: ModKind, stat: &StatId, ctx: &QueryContext) -> f64 {
        if !matches!(kind, ModKind::Base | ModKind::Inc) {
            return 0.0;
        }
        self.matching(kind, stat, ctx).iter().map(|(_, v)| v).sum()
    }

    /// Product of `1 + value` over matching MORE modifiers.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcalc::*;
    ///
    /// let src = ModSource::new(SourceCategory::Skill);
    /// let db: ModDb = [0.5, -0.2]
    ///     .into_iter()
    ///     .map(|v| Mod::new("Damage", ModKind::More, v, src.clone()))
    ///     .collect();
    /// let more = db.more(&StatId::new("Damage"), &QueryContext::new());
    /// assert!((more - 1.2).abs() < 1e-9); // 1.5 * 0.8
    /// ```
    pub fn more(&self, stat: &StatId, ctx: &QueryContext) -> f64 {
        self.matching(ModKind::More, stat, ctx)
            .iter()
            .map(|(_, v)| 1.0 + v)
            .product()
    }

    /// Value of the last-added matching OVERRIDE, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcalc::*;
    ///
    /// let src = ModSource::new(SourceCategory::Passive);
    /// let mut db = ModDb::new();
    /// let life = StatId::new("Life");
    /// assert_eq!(db.override_value(&life, &QueryContext::new()), None);
    ///
    /// db.add(Mod::new("Life", ModKind::Override, 50.0, src.clone()));
    /// db.add(Mod::new("Life", ModKind::Override, 1.0, src));
    /// assert_eq!(db.override_value(&life, &QueryContext::new()), Some(1.0));
    /// ```
    pub fn override_value(&self, stat: &StatId, ctx: &QueryContext) -> Option<f64> {
        self.matching(ModKind::Override, stat, ctx)
            .last()
            .map(|(_, v)| *v)
    }

    /// Whether any matching FLAG modifier is set.
    pub fn flag(&self, stat: &StatId, ctx: &QueryContext) -> bool {
        self.matching(ModKind::Flag, stat, ctx)
            .iter()
            .any(|(m, _)| matches!(m.value, ModValue::Flag(true)))
    }

    /// Values of matching LIST modifiers, in insertion order.
    pub fn list(&self, stat: &StatId, ctx: &QueryContext) -> Vec<&ModValue> {
        self.matching(ModKind::List, stat, ctx)
            .into_iter()
            .map(|(m, _)| &m.value)
            .collect()
    }
}

impl FromIterator<Mod> for ModDb {
    fn from_iter<I: IntoIterator<Item = Mod>>(iter: I) -> Self {
        let mut db = ModDb::new();
        db.add_all(iter);
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{Condition, ModSource};

    fn src(category: SourceCategory, id: &str) -> ModSource {
        ModSource::with_id(category, id)
    }

    #[test]
    fn test_sum_base_and_inc() {
        let mut db = ModDb::new();
        let s = src(SourceCategory::Passive, "1");
        db.add(Mod::new("Armour", ModKind::Base, 100.0, s.clone()));
        db.add(Mod::new("Armour", ModKind::Base, 25.0, s.clone()));
        db.add(Mod::new("Armour", ModKind::Inc, 0.5, s.clone()));
        db.add(Mod::new("Armour", ModKind::Inc, -0.1, s));

        let ctx = QueryContext::new();
        let armour = StatId::new("Armour");
        assert_eq!(db.sum(ModKind::Base, &armour, &ctx), 125.0);
        assert!((db.sum(ModKind::Inc, &armour, &ctx) - 0.4).abs() < 1e-9);
        assert_eq!(db.more(&armour, &ctx), 1.0);
    }

    #[test]
    fn test_sum_ignores_non_additive_kinds() {
        let s = src(SourceCategory::Passive, "1");
        let mut db = ModDb::new();
        db.add(Mod::new("Life", ModKind::More, 0.5, s.clone()));
        db.add(Mod::new("Life", ModKind::Override, 1.0, s.clone()));
        db.add(Mod::flag("Life", s));

        let ctx = QueryContext::new();
        let life = StatId::new("Life");
        for kind in [ModKind::More, ModKind::Override, ModKind::Flag, ModKind::List] {
            assert_eq!(db.sum(kind, &life, &ctx), 0.0);
        }
    }

    #[test]
    fn test_more_is_multiplicative() {
        let s = src(SourceCategory::Skill, "Melee Physical Damage Support");
        let db: ModDb = [0.5, 0.2, -0.1]
            .into_iter()
            .map(|v| Mod::new("Damage", ModKind::More, v, s.clone()))
            .collect();
        let expected = 1.5 * 1.2 * 0.9;
        assert!((db.more(&"Damage".into(), &QueryContext::new()) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_override_last_added_wins() {
        let s = src(SourceCategory::Passive, "ci");
        let mut db = ModDb::new();
        db.add(Mod::new("Life", ModKind::Override, 1.0, s.clone()));
        db.add(Mod::new("Life", ModKind::Override, 7.0, s));
        assert_eq!(db.override_value(&"Life".into(), &QueryContext::new()), Some(7.0));
        assert_eq!(db.override_value(&"Mana".into(), &QueryContext::new()), None);
    }

    #[test]
    fn test_flag_filtering() {
        let s = src(SourceCategory::Item, "gloves");
        let mut db = ModDb::new();
        db.add(Mod::new("Damage", ModKind::Inc, 0.1, s.clone()));
        db.add(Mod::new("Damage", ModKind::Inc, 0.2, s.clone()).with_flags(ModFlags::ATTACK));
        db.add(
            Mod::new("Damage", ModKind::Inc, 0.4, s)
                .with_keyword_flags(KeywordFlags::FIRE),
        );

        let dmg = StatId::new("Damage");
        let none = QueryContext::new();
        let attack = QueryContext::new().with_flags(ModFlags::ATTACK | ModFlags::HIT);
        let fire_attack = attack.clone().with_keyword_flags(KeywordFlags::FIRE);

        assert!((db.sum(ModKind::Inc, &dmg, &none) - 0.1).abs() < 1e-9);
        assert!((db.sum(ModKind::Inc, &dmg, &attack) - 0.3).abs() < 1e-9);
        assert!((db.sum(ModKind::Inc, &dmg, &fire_attack) - 0.7).abs() < 1e-9);
        assert_eq!(db.with_flags(ModFlags::empty()).len(), 2);
        assert_eq!(db.with_keyword_flags(KeywordFlags::FIRE).len(), 3);
    }

    #[test]
    fn test_conditional_mods() {
        let s = src(SourceCategory::Passive, "pain attunement");
        let mut db = ModDb::new();
        db.add(
            Mod::new("Damage", ModKind::More, 0.3, s.clone()).with_condition(Condition::Flag {
                var: "LowLife".into(),
                negated: false,
            }),
        );
        db.add(
            Mod::new("Damage", ModKind::Inc, 0.04, s).with_condition(Condition::Multiplier {
                stat: "PowerCharges".into(),
                per: 1.0,
                limit: None,
            }),
        );

        let dmg = StatId::new("Damage");
        let ctx = QueryContext::new()
            .with_condition("LowLife", true)
            .with_stat_value("PowerCharges", 3.0);
        assert!((db.more(&dmg, &ctx) - 1.3).abs() < 1e-9);
        assert!((db.sum(ModKind::Inc, &dmg, &ctx) - 0.12).abs() < 1e-9);
        assert_eq!(db.sum(ModKind::Inc, &dmg, &QueryContext::new()), 0.0);
    }

    #[test]
    fn test_remove_by_source() {
        let mut db = ModDb::new();
        db.add(Mod::new("Life", ModKind::Base, 10.0, src(SourceCategory::Passive, "1")));
        db.add(Mod::new("Life", ModKind::Base, 20.0, src(SourceCategory::Passive, "2")));
        db.add(Mod::new("Mana", ModKind::Base, 5.0, src(SourceCategory::Item, "ring")));

        assert_eq!(db.remove_by_source(SourceCategory::Passive, Some("1")), 1);
        assert_eq!(db.sum(ModKind::Base, &"Life".into(), &QueryContext::new()), 20.0);
        assert_eq!(db.remove_by_source(SourceCategory::Passive, None), 1);
        assert!(!db.has_stat(&"Life".into()));
        assert!(db.has_mod(ModKind::Base, &"Mana".into()));
        assert_eq!(db.remove_by_source(SourceCategory::Skill, None), 0);
    }

    #[test]
    fn test_merge_is_independent_copy() {
        let mut a = ModDb::new();
        a.add(Mod::new("Life", ModKind::Base, 10.0, ModSource::default()));
        let mut b = ModDb::new();
        b.merge(&a);
        a.remove_by_source(SourceCategory::Custom, None);
        assert!(a.is_empty());
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_compose_preserves_order() {
        let a: ModDb = [Mod::new("A", ModKind::Base, 1.0, ModSource::default())]
            .into_iter()
            .collect();
        let b: ModDb = [
            Mod::new("B", ModKind::Base, 2.0, ModSource::default()),
            Mod::new("A", ModKind::Base, 3.0, ModSource::default()),
        ]
        .into_iter()
        .collect();
        let db = ModDb::compose([&a, &b]);
        let names: Vec<&str> = db.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "A"]);
        assert_eq!(db.mods_for(&"A".into()).len(), 2);
        assert_eq!(db.stat_names().len(), 2);
    }

    #[test]
    fn test_flag_and_list_queries() {
        let s = ModSource::new(SourceCategory::Skill);
        let mut db = ModDb::new();
        db.add(Mod::flag("CannotBeEvaded", s.clone()));
        db.add(Mod::list("ActiveSkill", "Fireball", s.clone()));
        db.add(Mod::list("ActiveSkill", "Frostbolt", s));
        let ctx = QueryContext::new();
        assert!(db.flag(&"CannotBeEvaded".into(), &ctx));
        assert!(!db.flag(&"Onslaught".into(), &ctx));
        let skills = db.list(&"ActiveSkill".into(), &ctx);
        assert_eq!(
            skills,
            vec![
                &ModValue::List("Fireball".into()),
                &ModValue::List("Frostbolt".into())
            ]
        );
    }
}
