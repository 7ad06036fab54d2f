//! Compiled form patterns.

use super::normalize::{parse_number, NUMBER};
use super::tables::FormDef;
use crate::error::CalcError;
use crate::modifier::ModKind;
use regex::Regex;

pub(crate) struct CompiledForm {
    pub id: String,
    regex: Regex,
    pub kind: Option<ModKind>,
    pub scale: f64,
    pub outputs: Vec<String>,
    pub value: Option<f64>,
    pub display_only: bool,
    pub local: bool,
    numbers: usize,
}

/// Captures of a successful form match.
pub(crate) struct FormMatch {
    /// Numbers in pattern order, before scaling.
    pub values: Vec<f64>,
    /// Text of the `stat` group.
    pub stat: Option<String>,
    /// Every other named group that participated, in pattern order.
    pub groups: Vec<(String, String)>,
}

impl CompiledForm {
    pub fn new(def: &FormDef) -> Result<Self, CalcError> {
        if def.kind.is_none() && !def.display_only {
            return Err(CalcError::TableFormat(format!(
                "form {:?} has no kind",
                def.id
            )));
        }
        let mut pattern = String::with_capacity(def.pattern.len() + 32);
        let mut numbers = 0;
        for (i, piece) in def.pattern.split('#').enumerate() {
            if i > 0 {
                pattern.push_str(&format!("(?P<n{}>{})", numbers, NUMBER));
                numbers += 1;
            }
            pattern.push_str(piece);
        }
        let regex = Regex::new(&pattern).map_err(|e| CalcError::InvalidPattern {
            pattern: def.pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            id: def.id.clone(),
            regex,
            kind: def.kind,
            scale: def.scale,
            outputs: def.outputs.clone(),
            value: def.value,
            display_only: def.display_only,
            local: def.local,
            numbers,
        })
    }

    pub fn captures(&self, text: &str) -> Option<FormMatch> {
        let caps = self.regex.captures(text)?;
        let values = (0..self.numbers)
            .filter_map(|i| caps.name(&format!("n{i}")))
            .filter_map(|m| parse_number(m.as_str()))
            .collect();
        let mut stat = None;
        let mut groups = Vec::new();
        for name in self.regex.capture_names().flatten() {
            let Some(m) = caps.name(name) else { continue };
            if name == "stat" {
                stat = Some(m.as_str().to_string());
            } else if !is_number_group(name) {
                groups.push((name.to_string(), m.as_str().to_string()));
            }
        }
        Some(FormMatch {
            values,
            stat,
            groups,
        })
    }
}

fn is_number_group(name: &str) -> bool {
    name.strip_prefix('n')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}
