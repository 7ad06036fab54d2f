//! Damage conversion.
//!
//! Damage types follow a fixed order: Physical → Lightning → Cold → Fire →
//! Chaos. Damage may only convert "down" that order. Conversion is capped
//! at 100% of the source type (over-capped tables are scaled down
//! proportionally); "gain as extra" is uncapped, additive, and always
//! computed from the pre-conversion amounts.

pub mod graph;

use crate::context::QueryContext;
use crate::modifier::ModKind;
use crate::stat_id::StatId;
use crate::store::ModDb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Damage types in conversion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DamageType {
    Physical,
    Lightning,
    Cold,
    Fire,
    Chaos,
}

impl DamageType {
    pub const ALL: [DamageType; 5] = [
        DamageType::Physical,
        DamageType::Lightning,
        DamageType::Cold,
        DamageType::Fire,
        DamageType::Chaos,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DamageType::Physical => "Physical",
            DamageType::Lightning => "Lightning",
            DamageType::Cold => "Cold",
            DamageType::Fire => "Fire",
            DamageType::Chaos => "Chaos",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether damage of type `from` may convert to `to`.
pub fn is_valid_conversion(from: DamageType, to: DamageType) -> bool {
    from < to
}

/// An amount of damage per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageVector([f64; 5]);

impl DamageVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, damage_type: DamageType, amount: f64) -> Self {
        self[damage_type] = amount;
        self
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DamageType, f64)> + '_ {
        DamageType::ALL.into_iter().map(|t| (t, self[t]))
    }
}

impl Index<DamageType> for DamageVector {
    type Output = f64;

    fn index(&self, t: DamageType) -> &f64 {
        &self.0[t.index()]
    }
}

impl IndexMut<DamageType> for DamageVector {
    fn index_mut(&mut self, t: DamageType) -> &mut f64 {
        &mut self.0[t.index()]
    }
}

/// Source type → target type → fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConversionMatrix([[f64; 5]; 5]);

impl ConversionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat list. Duplicate pairs are summed; pairs that break
    /// the damage-type order are dropped.
    pub fn from_entries(entries: &[(DamageType, DamageType, f64)]) -> Self {
        let mut matrix = Self::new();
        for &(from, to, value) in entries {
            matrix.add(from, to, value);
        }
        matrix
    }

    /// Accumulate a conversion. Returns false (and changes nothing) for an
    /// invalid pair.
    pub fn add(&mut self, from: DamageType, to: DamageType, value: f64) -> bool {
        if !is_valid_conversion(from, to) {
            return false;
        }
        self.0[from.index()][to.index()] += value;
        true
    }

    pub fn get(&self, from: DamageType, to: DamageType) -> f64 {
        self.0[from.index()][to.index()]
    }

    /// Sum of everything `from` converts to.
    pub fn total_conversion(&self, from: DamageType) -> f64 {
        self.0[from.index()].iter().sum()
    }

    /// Targets of `from` with a positive percentage, in damage-type order.
    pub fn targets(&self, from: DamageType) -> impl Iterator<Item = (DamageType, f64)> + '_ {
        DamageType::ALL
            .into_iter()
            .map(move |to| (to, self.get(from, to)))
            .filter(|&(_, pct)| pct > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().flatten().all(|&v| v == 0.0)
    }

    /// Scale every over-capped source type down so its outgoing total is
    /// exactly 1.0. Other rows are unchanged.
    pub fn normalize(&self) -> Self {
        let mut out = *self;
        for row in out.0.iter_mut() {
            let total: f64 = row.iter().sum();
            if total > 1.0 {
                for v in row.iter_mut() {
                    *v /= total;
                }
            }
        }
        out
    }
}

/// Kind of a recorded conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    Convert,
    GainAsExtra,
}

/// One movement of damage between types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionStep {
    pub from: DamageType,
    pub to: DamageType,
    pub amount: f64,
    pub kind: StepKind,
}

/// Output of [`apply_conversions`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub damage: DamageVector,
    pub steps: Vec<ConversionStep>,
}

/// Apply conversion and gain-as-extra tables to a base damage vector.
///
/// # Examples
///
/// ```rust
/// use modcalc::conversion::*;
///
/// let base = DamageVector::new().with(DamageType::Physical, 100.0);
/// let conv = ConversionMatrix::from_entries(&[(DamageType::Physical, DamageType::Fire, 0.5)]);
/// let gain = ConversionMatrix::from_entries(&[(DamageType::Physical, DamageType::Cold, 0.3)]);
///
/// let result = apply_conversions(&base, &conv, &gain);
/// assert_eq!(result.damage[DamageType::Physical], 50.0);
/// assert_eq!(result.damage[DamageType::Fire], 50.0);
/// assert!((result.damage[DamageType::Cold] - 30.0).abs() < 1e-9);
/// ```
pub fn apply_conversions(
    base: &DamageVector,
    conversions: &ConversionMatrix,
    gain_as_extra: &ConversionMatrix,
) -> ConversionResult {
    let conversions = conversions.normalize();
    let mut damage = *base;
    let mut steps = Vec::new();

    for from in DamageType::ALL {
        let remaining = damage[from];
        if remaining <= 0.0 {
            continue;
        }
        let mut converted = 0.0;
        for (to, pct) in conversions.targets(from) {
            let amount = remaining * pct;
            damage[to] += amount;
            converted += amount;
            steps.push(ConversionStep {
                from,
                to,
                amount,
                kind: StepKind::Convert,
            });
        }
        damage[from] -= converted;
    }

    for from in DamageType::ALL {
        let original = base[from];
        if original <= 0.0 {
            continue;
        }
        for (to, pct) in gain_as_extra.targets(from) {
            let amount = original * pct;
            damage[to] += amount;
            steps.push(ConversionStep {
                from,
                to,
                amount,
                kind: StepKind::GainAsExtra,
            });
        }
    }

    ConversionResult { damage, steps }
}

/// Every damage type whose damage can end up as `final_type` through
/// positive conversions.
pub fn inheritance_chain(final_type: DamageType, conversions: &ConversionMatrix) -> Vec<DamageType> {
    graph::ConversionGraph::from_matrix(conversions).upstream_of(final_type)
}

/// Conversion and gain-as-extra tables read from a modifier store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionTable {
    pub conversions: ConversionMatrix,
    pub gain_as_extra: ConversionMatrix,
}

impl ConversionTable {
    /// Collect `{From}DamageConvertTo{To}` and `{From}DamageGainAs{To}`
    /// BASE sums for every valid pair.
    pub fn from_store(store: &ModDb, ctx: &QueryContext) -> Self {
        let mut table = Self::default();
        for from in DamageType::ALL {
            for to in DamageType::ALL {
                if !is_valid_conversion(from, to) {
                    continue;
                }
                let convert = StatId::from(format!("{from}DamageConvertTo{to}"));
                let gain = StatId::from(format!("{from}DamageGainAs{to}"));
                table
                    .conversions
                    .add(from, to, store.sum(ModKind::Base, &convert, ctx));
                table
                    .gain_as_extra
                    .add(from, to, store.sum(ModKind::Base, &gain, ctx));
            }
        }
        table
    }

    pub fn apply(&self, base: &DamageVector) -> ConversionResult {
        apply_conversions(base, &self.conversions, &self.gain_as_extra)
    }
}
