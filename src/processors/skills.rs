//! Skill store.
//!
//! Every enabled gem in an enabled group contributes a LIST modifier naming
//! it (`ActiveSkill` or `SupportGem`) plus whatever its stat lines parse
//! to. Gem level and quality do not scale those lines.

use super::parse_into;
use crate::build::{BuildSpec, Gem};
use crate::modifier::{Mod, ModSource, ModTag, SourceCategory};
use crate::parser::{ModParser, ParseContext};
use crate::store::ModDb;
use tracing::trace;

/// Support gems whose names lack the " Support" suffix.
pub const SUPPORT_ALLOW_LIST: &[&str] = &["Empower", "Enlighten", "Enhance", "Awaken"];

/// Support gems are recognised by name: a " Support" suffix or an entry in
/// [`SUPPORT_ALLOW_LIST`].
pub fn is_support_gem(name: &str) -> bool {
    let name = name.trim();
    name.to_lowercase().ends_with(" support")
        || SUPPORT_ALLOW_LIST
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name))
}

/// Stat lines of a gem at its level and quality.
///
/// Level and quality scaling is not modelled; the listed lines are used
/// as-is.
pub fn scaled_gem_stats(gem: &Gem) -> impl Iterator<Item = &str> {
    gem.stats.iter().map(String::as_str)
}

pub fn build_skill_store(parser: &ModParser, build: &BuildSpec) -> ModDb {
    let mut store = ModDb::new();
    for group in build.skill_groups.iter().filter(|g| g.enabled) {
        for gem in group.gems.iter().filter(|g| g.enabled) {
            let source = ModSource::with_id(SourceCategory::Skill, gem.name.clone());
            let kind = if is_support_gem(&gem.name) {
                "SupportGem"
            } else {
                "ActiveSkill"
            };
            let mut entry = Mod::list(kind, gem.name.clone(), source.clone());
            if !group.label.is_empty() {
                entry = entry.with_tag(ModTag::Label(group.label.clone()));
            }
            store.add(entry);
            parse_into(
                parser,
                &mut store,
                scaled_gem_stats(gem),
                &ParseContext::new(source),
            );
        }
    }
    trace!(mods = store.len(), "built skill store");
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::SkillGroup;
    use crate::context::QueryContext;
    use crate::modifier::ModValue;
    use crate::parser::tables::ParserTables;

    #[test]
    fn test_support_classification() {
        assert!(is_support_gem("Added Fire Damage Support"));
        assert!(is_support_gem("Enlighten"));
        assert!(is_support_gem("empower"));
        assert!(!is_support_gem("Fireball"));
        assert!(!is_support_gem("Supportive Strike"));
    }

    #[test]
    fn test_skill_store() {
        let parser = ModParser::new(ParserTables::builtin().unwrap()).unwrap();
        let mut build = BuildSpec::new("Witch");
        let mut fireball = Gem::new("Fireball");
        fireball.stats.push("10% increased cast speed".into());
        let mut disabled = Gem::new("Frostbolt");
        disabled.enabled = false;
        build.skill_groups.push(SkillGroup {
            label: "Main".into(),
            gems: vec![fireball, Gem::new("Spell Echo Support"), disabled],
            ..SkillGroup::default()
        });
        build.skill_groups.push(SkillGroup {
            enabled: false,
            gems: vec![Gem::new("Arc")],
            ..SkillGroup::default()
        });

        let store = build_skill_store(&parser, &build);
        let ctx = QueryContext::new();
        assert_eq!(
            store.list(&"ActiveSkill".into(), &ctx),
            vec![&ModValue::List("Fireball".into())]
        );
        assert_eq!(store.list(&"SupportGem".into(), &ctx).len(), 1);
        assert!(store.has_stat(&"Speed".into()));
        assert_eq!(store.len(), 3);
    }
}
