//! Pre-parsed mod cache.
//!
//! Exact entries are looked up by normalized text. Range entries contain
//! `(a-b)` placeholders and are compiled to regexes; an input matches when
//! every captured number lies inside its range (bounds inclusive).

use super::normalize::{normalize, parse_number, NUMBER};
use super::resolve_flags;
use super::tables::CacheDef;
use crate::error::CalcError;
use crate::flags::{KeywordFlags, ModFlags};
use crate::modifier::{Condition, ModKind, ModValue};
use crate::stat_id::StatId;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((-?\d+(?:\.\d+)?)-(-?\d+(?:\.\d+)?)\)").expect("valid regex")
});

/// A cached modifier with its flag names resolved.
pub(crate) struct CachedEffect {
    pub name: StatId,
    pub kind: ModKind,
    pub value: ModValue,
    pub scale: f64,
    pub flags: ModFlags,
    pub keyword_flags: KeywordFlags,
    pub condition: Option<Condition>,
}

pub(crate) struct CacheEntry {
    pub effects: Vec<CachedEffect>,
    pub local: bool,
    pub display_only: bool,
}

struct RangeEntry {
    regex: Regex,
    ranges: Vec<(f64, f64)>,
    entry: CacheEntry,
}

/// A cache hit. `numbers` is set for range entries: the values captured
/// at each range position.
pub(crate) struct CacheHit<'a> {
    pub entry: &'a CacheEntry,
    pub numbers: Option<Vec<f64>>,
}

#[derive(Default)]
pub(crate) struct ModCache {
    exact: HashMap<String, CacheEntry>,
    ranged: Vec<RangeEntry>,
}

impl ModCache {
    pub fn new(defs: &[CacheDef]) -> Result<Self, CalcError> {
        let mut cache = Self::default();
        for def in defs {
            let text = normalize(&def.text);
            let effects = def
                .effects
                .iter()
                .map(|e| {
                    let (flags, keyword_flags) = resolve_flags(&e.flags, &e.keyword_flags)?;
                    Ok(CachedEffect {
                        name: e.name.clone(),
                        kind: e.kind,
                        value: e.value.clone(),
                        scale: e.scale,
                        flags,
                        keyword_flags,
                        condition: e.condition.clone(),
                    })
                })
                .collect::<Result<Vec<_>, CalcError>>()?;
            let entry = CacheEntry {
                effects,
                local: def.local,
                display_only: def.display_only,
            };
            if RANGE_RE.is_match(&text) {
                let (regex, ranges) = compile_range(&text)?;
                cache.ranged.push(RangeEntry {
                    regex,
                    ranges,
                    entry,
                });
            } else {
                cache.exact.entry(text).or_insert(entry);
            }
        }
        Ok(cache)
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.ranged.len()
    }

    /// Look up normalized text: exact entries first, then range entries in
    /// table order.
    pub fn lookup(&self, text: &str) -> Option<CacheHit<'_>> {
        if let Some(entry) = self.exact.get(text) {
            return Some(CacheHit {
                entry,
                numbers: None,
            });
        }
        self.ranged.iter().find_map(|r| {
            let caps = r.regex.captures(text)?;
            let numbers: Vec<f64> = (1..caps.len())
                .map(|i| caps.get(i).and_then(|m| parse_number(m.as_str())))
                .collect::<Option<_>>()?;
            let in_range = numbers
                .iter()
                .zip(&r.ranges)
                .all(|(n, (lo, hi))| n >= lo && n <= hi);
            in_range.then_some(CacheHit {
                entry: &r.entry,
                numbers: Some(numbers),
            })
        })
    }
}

fn compile_range(text: &str) -> Result<(Regex, Vec<(f64, f64)>), CalcError> {
    let mut pattern = String::from("^");
    let mut ranges = Vec::new();
    let mut last = 0;
    for caps in RANGE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        pattern.push_str(&regex::escape(&text[last..whole.start()]));
        pattern.push('(');
        pattern.push_str(NUMBER);
        pattern.push(')');
        let a = caps.get(1).and_then(|m| parse_number(m.as_str()));
        let b = caps.get(2).and_then(|m| parse_number(m.as_str()));
        let (Some(a), Some(b)) = (a, b) else {
            return Err(CalcError::InvalidPattern {
                pattern: text.to_string(),
                message: "unreadable range bounds".into(),
            });
        };
        ranges.push((a.min(b), a.max(b)));
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&text[last..]));
    pattern.push('$');
    let regex = Regex::new(&pattern).map_err(|e| CalcError::InvalidPattern {
        pattern: text.to_string(),
        message: e.to_string(),
    })?;
    Ok((regex, ranges))
}
