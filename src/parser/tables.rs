//! Parser table definitions.
//!
//! The parser is entirely data-driven: form patterns, phrase tables and the
//! pre-parsed mod cache are loaded from a JSON document before the first
//! parse. A default document ships with the crate.

use crate::error::CalcError;
use crate::modifier::{Condition, ModKind, ModValue};
use crate::stat_id::StatId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const BUILTIN_TABLES: &str = include_str!("../../data/parser_tables.json");

/// Every table the parser needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserTables {
    #[serde(default)]
    pub forms: Vec<FormDef>,
    #[serde(default)]
    pub stats: Vec<StatDef>,
    #[serde(default)]
    pub flags: Vec<FlagDef>,
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
    #[serde(default)]
    pub cache: Vec<CacheDef>,
}

/// A form pattern: a regex over normalized text.
///
/// `#` stands for a number; a named group `stat` holds the stat phrase;
/// other named groups can be used by `outputs` templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDef {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub kind: Option<ModKind>,
    /// Multiplier applied to every captured number.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Output stat name templates, one modifier per entry. Defaults to
    /// `["{stat}"]`.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Value used when the form captures no number.
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub display_only: bool,
    /// Tag produced modifiers with the parse context's slot.
    #[serde(default)]
    pub local: bool,
}

/// A stat phrase and the stat (plus implied flags) it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatDef {
    pub phrase: String,
    pub stat: StatId,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub keyword_flags: Vec<String>,
}

/// A phrase that restricts a modifier to flags or keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagDef {
    pub phrase: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub keyword_flags: Vec<String>,
}

/// A condition phrase. A `#` in the phrase supplies the threshold of a
/// `stat_threshold` or the divisor of a `multiplier` condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDef {
    pub phrase: String,
    pub condition: Condition,
}

/// A pre-parsed line. `(a-b)` in `text` marks an inclusive numeric range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDef {
    pub text: String,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub display_only: bool,
}

/// One cached modifier. For range entries, numbers read from the text
/// replace `value` positionally after multiplying by `scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectDef {
    pub name: StatId,
    pub kind: ModKind,
    pub value: ModValue,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub keyword_flags: Vec<String>,
    #[serde(default)]
    pub condition: Option<Condition>,
}

fn default_scale() -> f64 {
    1.0
}

impl ParserTables {
    /// The tables bundled with the crate.
    pub fn builtin() -> Result<Self, CalcError> {
        Self::from_json_str(BUILTIN_TABLES)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CalcError> {
        let tables: ParserTables = serde_json::from_str(json)?;
        debug!(
            forms = tables.forms.len(),
            stats = tables.stats.len(),
            cache = tables.cache.len(),
            "parsed parser tables"
        );
        Ok(tables)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CalcError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CalcError::TableIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}
