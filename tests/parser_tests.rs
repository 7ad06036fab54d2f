use modcalc::parser::registry::{shared_parser, ParserCell};
use modcalc::parser::tables::ParserTables;
use modcalc::*;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parser() -> ModParser {
    ModParser::new(ParserTables::builtin().unwrap()).unwrap()
}

fn item_ctx() -> ParseContext {
    ParseContext::new(ModSource::with_id(SourceCategory::Item, "helmet"))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Exact cache lines keep their pre-parsed effects.
#[test]
fn test_exact_cache_hit() {
    init_tracing();
    let result = parser().parse("Maximum Life becomes 1, Immune to Chaos Damage", &item_ctx());
    assert!(result.success);
    assert_eq!(result.support, SupportLevel::Full);
    assert_eq!(result.mods.len(), 2);

    let life = &result.mods[0];
    assert_eq!(life.name.as_str(), "Life");
    assert_eq!(life.kind, ModKind::Override);
    assert!(approx(life.value.as_number(), 1.0));

    let immune = &result.mods[1];
    assert_eq!(immune.name.as_str(), "ChaosDamageImmune");
    assert_eq!(immune.value, ModValue::Flag(true));
    assert!(result.mods.iter().all(|m| m.source == item_ctx().source));
}

/// Rolled values inside a cached range are substituted into the effect.
#[test]
fn test_ranged_cache_hit() {
    let p = parser();
    let result = p.parse("9% increased Attack Speed", &item_ctx());
    assert_eq!(result.support, SupportLevel::Full);
    let m = &result.mods[0];
    assert_eq!(m.name.as_str(), "Speed");
    assert_eq!(m.kind, ModKind::Inc);
    assert_eq!(m.flags, ModFlags::ATTACK);
    assert!(approx(m.value.as_number(), 0.09));

    let result = p.parse("Adds 2 to 4 Lightning Damage to Attacks", &item_ctx());
    let values: Vec<(&str, f64)> = result
        .mods
        .iter()
        .map(|m| (m.name.as_str(), m.value.as_number()))
        .collect();
    assert_eq!(
        values,
        vec![("LightningDamageMin", 2.0), ("LightningDamageMax", 4.0)]
    );
}

/// Out-of-range rolls fall through to the pattern table and still parse.
#[test]
fn test_out_of_range_falls_back_to_forms() {
    let result = parser().parse("12% increased Attack Speed", &item_ctx());
    assert_eq!(result.support, SupportLevel::Full);
    let m = &result.mods[0];
    assert_eq!(m.name.as_str(), "Speed");
    assert!(m.flags.contains(ModFlags::ATTACK));
    assert!(approx(m.value.as_number(), 0.12));
}

/// Local cached lines are tagged with the slot being parsed.
#[test]
fn test_local_cache_entry_tags_slot() {
    let ctx = item_ctx().with_slot("Weapon 1");
    let result = parser().parse("185% increased Physical Damage", &ctx);
    let m = &result.mods[0];
    assert_eq!(m.name.as_str(), "PhysicalDamage");
    assert!(approx(m.value.as_number(), 1.85));
    assert_eq!(m.tag, Some(ModTag::SlotName("Weapon 1".into())));
}

/// Parsing is a pure function of text and context.
#[test]
fn test_parse_is_deterministic() {
    let lines = [
        "+45 to maximum Life",
        "Adds 5 to 9 Fire Damage to Attacks",
        "20% increased Spell Damage while on Full Life",
        "Socketed Gems are supported by Level 20 Faster Attacks Support",
        "some unheard-of modifier text",
    ];
    let p = parser();
    let fresh = parser();
    for line in lines {
        let first = p.parse(line, &item_ctx());
        let second = p.parse(line, &item_ctx());
        let other = fresh.parse(line, &item_ctx());
        assert_eq!(first.mods, second.mods, "{line}");
        assert_eq!(first.mods, other.mods, "{line}");
        assert_eq!(first.support, other.support, "{line}");
    }
}

/// Every line of an item yields exactly one result, supported or not.
#[test]
fn test_item_text_parsing() {
    let text = "\
        +70 to maximum Life\n\
        Has no Sockets\n\
        Socketed Gems are supported by Level 18 Melee Splash Support\n\
        Flibbertigibbet\n";
    let results = parser().parse_lines(text, &item_ctx());
    let support: Vec<SupportLevel> = results.iter().map(|r| r.support).collect();
    assert_eq!(
        support,
        vec![
            SupportLevel::Full,
            SupportLevel::DisplayOnly,
            SupportLevel::Full,
            SupportLevel::Unsupported,
        ]
    );
    assert_eq!(
        results[2].mods[0].value,
        ModValue::List("melee splash support".into())
    );
    assert_eq!(results[3].reason.as_deref(), Some("no matching pattern"));
}

/// Results serialize for reporting unsupported lines.
#[test]
fn test_result_serializes() {
    let result = parser().parse("10% increased frobnication rate", &item_ctx());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["support"], "partial");
    assert_eq!(json["success"], true);
}

/// Parsed lines feed straight into a store.
#[test]
fn test_parsed_mods_resolve() {
    let p = parser();
    let mut db = ModDb::new();
    for line in [
        "+100 to maximum Life",
        "+20 to Strength",
        "30% increased maximum Life",
        "10% more maximum Life",
    ] {
        db.add_all(p.parse(line, &item_ctx()).mods);
    }
    let mut resolver = StatResolver::new(Arc::new(db));
    // (100 + 20 / 2) * 1.3 * 1.1
    assert!(approx(resolver.value("Life"), 110.0 * 1.3 * 1.1));
}

/// The shared parser is built once and handed out to every caller.
#[test]
fn test_shared_parser_is_singleton() {
    let a = shared_parser().unwrap();
    let b = shared_parser().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(
        a.parse("+5 to maximum Life", &item_ctx()).mods,
        parser().parse("+5 to maximum Life", &item_ctx()).mods
    );
}

/// A private cell can be loaded from custom tables.
#[test]
fn test_custom_tables_in_cell() {
    let cell = ParserCell::new();
    let json = r##"{
        "forms": [{"id": "gain", "pattern": "^gain # (?P<stat>.+)$", "kind": "BASE"}],
        "stats": [{"phrase": "rage", "stat": "Rage"}]
    }"##;
    let loaded = cell
        .get_or_load(|| ModParser::new(ParserTables::from_json_str(json)?))
        .unwrap();
    let result = loaded.parse("Gain 5 Rage", &item_ctx());
    assert_eq!(result.mods[0].name.as_str(), "Rage");
    assert!(approx(result.mods[0].value.as_number(), 5.0));
    assert!(cell.is_loaded());

    let invalid = ParserTables::from_json_str(
        r#"{"forms": [{"id": "bad", "pattern": "^(unclosed$", "kind": "BASE"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        ModParser::new(invalid),
        Err(CalcError::InvalidPattern { .. })
    ));
}
