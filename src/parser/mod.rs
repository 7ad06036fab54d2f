//! Text-to-modifier parser.
//!
//! `ModParser` turns one line of game text ("12% increased Attack Speed")
//! into zero or more [`Mod`]s. It is driven entirely by [`ParserTables`]:
//! a pre-parsed cache of known lines is consulted first, then the form
//! patterns in table order. Parsing never fails; every line comes back
//! classified by a [`SupportLevel`].
//!
//! ```rust
//! use modcalc::parser::{ModParser, ParseContext, SupportLevel, tables::ParserTables};
//! use modcalc::{ModKind, ModSource, SourceCategory};
//!
//! let parser = ModParser::new(ParserTables::builtin().unwrap()).unwrap();
//! let ctx = ParseContext::new(ModSource::with_id(SourceCategory::Passive, "1031"));
//!
//! let result = parser.parse("12% increased Attack Speed", &ctx);
//! assert_eq!(result.support, SupportLevel::Full);
//! assert_eq!(result.mods[0].name.as_str(), "Speed");
//! assert_eq!(result.mods[0].kind, ModKind::Inc);
//! assert!((result.mods[0].value.as_number() - 0.12).abs() < 1e-9);
//! ```

pub(crate) mod cache;
pub(crate) mod forms;
pub mod normalize;
pub(crate) mod phrases;
pub mod registry;
pub mod tables;

use crate::error::CalcError;
use crate::flags::{KeywordFlags, ModFlags};
use crate::modifier::{Condition, Mod, ModKind, ModSource, ModTag, ModValue};
use crate::stat_id::{pascal_case, StatId};
use cache::{CacheHit, ModCache};
use forms::{CompiledForm, FormMatch};
use normalize::{normalize, squash};
use parking_lot::Mutex;
use phrases::PhraseSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tables::ParserTables;
use tracing::{debug, trace};

/// Memoized lines kept before the memo is dropped and refilled.
const MEMO_CAPACITY: usize = 8192;

/// Words that may remain after a stat phrase is read without making the
/// match partial.
const FILLER: &[&str] = &[
    "a", "an", "and", "are", "for", "global", "is", "of", "the", "to", "with", "you", "your",
];

/// How completely a line was understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    /// Every part of the line was recognised.
    Full,
    /// Modifiers were produced but some text was not understood.
    Partial,
    /// Recognised line that carries no modifiers (`Corrupted`).
    DisplayOnly,
    /// Nothing matched.
    Unsupported,
}

/// Where parsed modifiers come from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    pub source: ModSource,
    /// Item slot, for lines marked local.
    pub slot: Option<String>,
}

impl ParseContext {
    pub fn new(source: ModSource) -> Self {
        Self { source, slot: None }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }
}

/// Outcome of parsing one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub success: bool,
    pub mods: Vec<Mod>,
    pub support: SupportLevel,
    pub warnings: Vec<String>,
    /// Why the line is unsupported.
    pub reason: Option<String>,
}

impl ParseResult {
    fn parsed(mods: Vec<Mod>, warnings: Vec<String>) -> Self {
        let support = if warnings.is_empty() {
            SupportLevel::Full
        } else {
            SupportLevel::Partial
        };
        Self {
            success: true,
            mods,
            support,
            warnings,
            reason: None,
        }
    }

    fn display_only() -> Self {
        Self {
            success: true,
            mods: Vec::new(),
            support: SupportLevel::DisplayOnly,
            warnings: Vec::new(),
            reason: None,
        }
    }

    fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            mods: Vec::new(),
            support: SupportLevel::Unsupported,
            warnings: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

/// A context-free parse, as stored in the memo.
struct Outcome {
    result: ParseResult,
    local: bool,
}

impl Outcome {
    fn new(result: ParseResult) -> Self {
        Self {
            result,
            local: false,
        }
    }

    fn stamp(&self, ctx: &ParseContext) -> ParseResult {
        let mut result = self.result.clone();
        for m in &mut result.mods {
            m.source = ctx.source.clone();
            if self.local {
                if let Some(slot) = &ctx.slot {
                    m.tag = Some(ModTag::SlotName(slot.clone()));
                }
            }
        }
        result
    }
}

struct StatEntry {
    stat: StatId,
    flags: ModFlags,
    keyword_flags: KeywordFlags,
}

struct FlagEntry {
    flags: ModFlags,
    keyword_flags: KeywordFlags,
}

struct ConditionEntry {
    condition: Condition,
}

impl ConditionEntry {
    /// Fill the phrase's `#` into the threshold or divisor.
    fn instantiate(&self, number: Option<f64>) -> Condition {
        let mut condition = self.condition.clone();
        if let Some(n) = number {
            match &mut condition {
                Condition::StatThreshold { threshold, .. } => *threshold = n,
                Condition::Multiplier { per, .. } => *per = n,
                Condition::Flag { .. } => {}
            }
        }
        condition
    }
}

/// What the `stat` group of a form says.
#[derive(Default)]
struct StatReading {
    stat: Option<StatId>,
    flags: ModFlags,
    keyword_flags: KeywordFlags,
    condition: Option<Condition>,
}

/// Resolve table flag names.
pub(crate) fn resolve_flags(
    flags: &[String],
    keyword_flags: &[String],
) -> Result<(ModFlags, KeywordFlags), CalcError> {
    let flags =
        ModFlags::from_names(flags.iter().map(String::as_str)).map_err(CalcError::UnknownFlag)?;
    let keyword_flags = KeywordFlags::from_names(keyword_flags.iter().map(String::as_str))
        .map_err(CalcError::UnknownFlag)?;
    Ok((flags, keyword_flags))
}

/// Compiled parser tables plus a memo of previously parsed lines.
pub struct ModParser {
    cache: ModCache,
    forms: Vec<CompiledForm>,
    stats: PhraseSet<StatEntry>,
    flags: PhraseSet<FlagEntry>,
    conditions: PhraseSet<ConditionEntry>,
    memo: Mutex<HashMap<String, Arc<Outcome>>>,
}

impl ModParser {
    /// Compile a table set. Fails on an invalid regex, an unknown flag name
    /// or an inconsistent condition entry.
    pub fn new(tables: ParserTables) -> Result<Self, CalcError> {
        let forms = tables
            .forms
            .iter()
            .map(CompiledForm::new)
            .collect::<Result<Vec<_>, _>>()?;

        let stats = tables
            .stats
            .into_iter()
            .map(|def| {
                let (flags, keyword_flags) = resolve_flags(&def.flags, &def.keyword_flags)?;
                let entry = StatEntry {
                    stat: def.stat,
                    flags,
                    keyword_flags,
                };
                Ok((def.phrase, entry))
            })
            .collect::<Result<Vec<_>, CalcError>>()?;

        let flags = tables
            .flags
            .into_iter()
            .map(|def| {
                let (flags, keyword_flags) = resolve_flags(&def.flags, &def.keyword_flags)?;
                Ok((
                    def.phrase,
                    FlagEntry {
                        flags,
                        keyword_flags,
                    },
                ))
            })
            .collect::<Result<Vec<_>, CalcError>>()?;

        let conditions = tables
            .conditions
            .into_iter()
            .map(|def| {
                let placeholders = def.phrase.matches('#').count();
                let takes_number = !matches!(def.condition, Condition::Flag { .. });
                if placeholders > 1 || (placeholders == 1 && !takes_number) {
                    return Err(CalcError::InvalidCondition {
                        phrase: def.phrase,
                        message: "unexpected # placeholder".into(),
                    });
                }
                Ok((
                    def.phrase,
                    ConditionEntry {
                        condition: def.condition,
                    },
                ))
            })
            .collect::<Result<Vec<_>, CalcError>>()?;

        let parser = Self {
            cache: ModCache::new(&tables.cache)?,
            forms,
            stats: PhraseSet::new(stats)?,
            flags: PhraseSet::new(flags)?,
            conditions: PhraseSet::new(conditions)?,
            memo: Mutex::new(HashMap::new()),
        };
        debug!(
            forms = parser.forms.len(),
            stats = parser.stats.len(),
            flags = parser.flags.len(),
            conditions = parser.conditions.len(),
            cache = parser.cache.len(),
            "compiled modifier parser"
        );
        Ok(parser)
    }

    /// Parse one line of modifier text.
    pub fn parse(&self, text: &str, ctx: &ParseContext) -> ParseResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return ParseResult::unsupported("empty modifier text");
        }
        let result = self.memoized(&normalized).stamp(ctx);
        trace!(
            text = %normalized,
            support = ?result.support,
            mods = result.mods.len(),
            "parsed modifier line"
        );
        result
    }

    /// Parse every non-blank line of a multi-line block.
    pub fn parse_lines(&self, text: &str, ctx: &ParseContext) -> Vec<ParseResult> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.parse(line, ctx))
            .collect()
    }

    /// Drop every memoized line.
    pub fn clear_memo(&self) {
        self.memo.lock().clear();
    }

    fn memoized(&self, normalized: &str) -> Arc<Outcome> {
        let cached = self.memo.lock().get(normalized).cloned();
        if let Some(outcome) = cached {
            return outcome;
        }
        let outcome = Arc::new(self.interpret(normalized));
        let mut memo = self.memo.lock();
        if memo.len() >= MEMO_CAPACITY {
            memo.clear();
        }
        memo.insert(normalized.to_string(), Arc::clone(&outcome));
        outcome
    }

    fn interpret(&self, text: &str) -> Outcome {
        if let Some(hit) = self.cache.lookup(text) {
            return self.from_cache(text, hit);
        }
        for form in &self.forms {
            if let Some(captures) = form.captures(text) {
                trace!(form = %form.id, "form matched");
                return self.from_form(text, form, captures);
            }
        }
        Outcome::new(ParseResult::unsupported("no matching pattern"))
    }

    fn from_cache(&self, text: &str, hit: CacheHit<'_>) -> Outcome {
        let entry = hit.entry;
        if entry.display_only {
            return Outcome::new(ParseResult::display_only());
        }
        let mut rest = text.to_string();
        let (flags, keyword_flags) = self.flag_phrases(&mut rest);
        let mut numbers = hit.numbers.unwrap_or_default().into_iter();
        let mods = entry
            .effects
            .iter()
            .map(|effect| {
                let value = match &effect.value {
                    ModValue::Number(literal) => {
                        ModValue::Number(numbers.next().map_or(*literal, |n| n * effect.scale))
                    }
                    other => other.clone(),
                };
                Mod {
                    name: effect.name.clone(),
                    kind: effect.kind,
                    value,
                    flags: effect.flags | flags,
                    keyword_flags: effect.keyword_flags | keyword_flags,
                    source: ModSource::default(),
                    condition: effect.condition.clone(),
                    tag: None,
                }
            })
            .collect();
        Outcome {
            result: ParseResult::parsed(mods, Vec::new()),
            local: entry.local,
        }
    }

    fn from_form(&self, text: &str, form: &CompiledForm, captures: FormMatch) -> Outcome {
        let Some(kind) = form.kind.filter(|_| !form.display_only) else {
            return Outcome::new(ParseResult::display_only());
        };

        let mut warnings = Vec::new();
        let reading = match (&captures.stat, kind) {
            (Some(phrase), k) if k != ModKind::List => self.read_stat(phrase, &mut warnings),
            _ => StatReading::default(),
        };
        let values: Vec<f64> = captures.values.iter().map(|v| v * form.scale).collect();
        let entry = captures
            .groups
            .iter()
            .find(|(name, _)| name == "entry")
            .map(|(_, value)| value.as_str())
            .or(captures.stat.as_deref())
            .unwrap_or(text);

        let default_outputs = [String::from("{stat}")];
        let outputs: &[String] = if form.outputs.is_empty() {
            &default_outputs
        } else {
            &form.outputs
        };

        let mut mods = Vec::with_capacity(outputs.len());
        for (i, template) in outputs.iter().enumerate() {
            let Some(name) = render(template, reading.stat.as_ref(), &captures.groups) else {
                return Outcome::new(ParseResult::unsupported(format!(
                    "form {} has no stat to name",
                    form.id
                )));
            };
            let number = values
                .get(i)
                .or(values.last())
                .copied()
                .or(form.value)
                .unwrap_or(1.0);
            let value = match kind {
                ModKind::Flag => ModValue::Flag(number != 0.0),
                ModKind::List => ModValue::List(entry.to_string()),
                _ => ModValue::Number(number),
            };
            mods.push(Mod {
                name: StatId::from(name),
                kind,
                value,
                flags: reading.flags,
                keyword_flags: reading.keyword_flags,
                source: ModSource::default(),
                condition: reading.condition.clone(),
                tag: None,
            });
        }

        Outcome {
            result: ParseResult::parsed(mods, warnings),
            local: form.local,
        }
    }

    /// Read a stat phrase: condition phrases first, then the longest stat
    /// phrase, then flag phrases from what is left.
    fn read_stat(&self, phrase: &str, warnings: &mut Vec<String>) -> StatReading {
        let mut rest = phrase.to_string();
        let condition = self
            .conditions
            .take_first(&mut rest)
            .map(|m| m.payload.instantiate(m.number));
        let stat_entry = self.stats.take_first(&mut rest).map(|m| m.payload);
        let (mut flags, mut keyword_flags) = self.flag_phrases(&mut rest);

        let leftover = squash(&rest)
            .split(' ')
            .filter(|word| !word.is_empty() && !FILLER.contains(word))
            .collect::<Vec<_>>()
            .join(" ");

        let stat = match stat_entry {
            Some(entry) => {
                flags |= entry.flags;
                keyword_flags |= entry.keyword_flags;
                if !leftover.is_empty() {
                    warnings.push(format!("unrecognised text \"{leftover}\""));
                }
                entry.stat.clone()
            }
            None => {
                let basis = if leftover.is_empty() {
                    squash(phrase)
                } else {
                    leftover
                };
                warnings.push(format!("unknown stat \"{basis}\""));
                StatId::synthesize(&basis)
            }
        };

        StatReading {
            stat: Some(stat),
            flags,
            keyword_flags,
            condition,
        }
    }

    fn flag_phrases(&self, text: &mut String) -> (ModFlags, KeywordFlags) {
        self.flags.take_all(text).into_iter().fold(
            (ModFlags::empty(), KeywordFlags::empty()),
            |(flags, keywords), m| (flags | m.payload.flags, keywords | m.payload.keyword_flags),
        )
    }
}

/// Fill `{stat}` and `{<group>}` placeholders. `None` when the template
/// needs a stat the form did not produce.
fn render(template: &str, stat: Option<&StatId>, groups: &[(String, String)]) -> Option<String> {
    let mut name = template.to_string();
    if name.contains("{stat}") {
        name = name.replace("{stat}", stat?.as_str());
    }
    for (group, text) in groups {
        let placeholder = format!("{{{group}}}");
        if name.contains(&placeholder) {
            name = name.replace(&placeholder, &pascal_case(text));
        }
    }
    Some(name)
}
