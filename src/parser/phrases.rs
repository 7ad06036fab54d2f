//! Compiled phrase tables.
//!
//! A phrase matches on word boundaries only, so "life" never matches inside
//! "lifetime". Sets are searched longest phrase first, which makes the more
//! specific of two overlapping phrases win.

use super::normalize::NUMBER;
use crate::error::CalcError;
use regex::Regex;

pub(crate) struct Phrase<T> {
    pub text: String,
    regex: Regex,
    pub payload: T,
}

/// A set of phrases sorted longest first.
pub(crate) struct PhraseSet<T> {
    entries: Vec<Phrase<T>>,
}

/// A phrase found in a string.
pub(crate) struct PhraseMatch<'a, T> {
    pub payload: &'a T,
    /// Number captured by a `#` placeholder, if the phrase has one.
    pub number: Option<f64>,
}

/// Compile a phrase into a word-bounded regex. `#` becomes a number capture.
pub(crate) fn compile_phrase(phrase: &str) -> Result<Regex, CalcError> {
    let mut pattern = String::new();
    if phrase.chars().next().is_some_and(char::is_alphanumeric) {
        pattern.push_str(r"\b");
    }
    for (i, piece) in phrase.split('#').enumerate() {
        if i > 0 {
            pattern.push('(');
            pattern.push_str(NUMBER);
            pattern.push(')');
        }
        pattern.push_str(&regex::escape(piece));
    }
    if phrase.chars().last().is_some_and(char::is_alphanumeric) {
        pattern.push_str(r"\b");
    }
    Regex::new(&pattern).map_err(|e| CalcError::InvalidPattern {
        pattern: phrase.to_string(),
        message: e.to_string(),
    })
}

impl<T> PhraseSet<T> {
    pub fn new(phrases: impl IntoIterator<Item = (String, T)>) -> Result<Self, CalcError> {
        let mut entries = phrases
            .into_iter()
            .map(|(text, payload)| {
                let text = super::normalize::normalize(&text);
                Ok(Phrase {
                    regex: compile_phrase(&text)?,
                    text,
                    payload,
                })
            })
            .collect::<Result<Vec<_>, CalcError>>()?;
        // Stable: equal lengths keep table order
        entries.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the longest phrase present in `text` and cut it out.
    pub fn take_first(&self, text: &mut String) -> Option<PhraseMatch<'_, T>> {
        self.entries.iter().find_map(|entry| cut(entry, text))
    }

    /// Cut every phrase occurrence out of `text`, longest phrases first.
    pub fn take_all(&self, text: &mut String) -> Vec<PhraseMatch<'_, T>> {
        let mut found = Vec::new();
        for entry in &self.entries {
            while let Some(m) = cut(entry, text) {
                found.push(m);
            }
        }
        found
    }
}

fn cut<'a, T>(entry: &'a Phrase<T>, text: &mut String) -> Option<PhraseMatch<'a, T>> {
    let caps = entry.regex.captures(text)?;
    let whole = caps.get(0)?;
    let number = caps
        .get(1)
        .and_then(|n| super::normalize::parse_number(n.as_str()));
    let range = whole.range();
    text.replace_range(range, " ");
    Some(PhraseMatch {
        payload: &entry.payload,
        number,
    })
}
