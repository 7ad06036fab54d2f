//! Stat identifier module.
//!
//! Provides the `StatId` type, the interned name a modifier targets
//! (`Life`, `FireDamage`, `Condition:LowLife`, ...). Uses `Arc<str>` so
//! that the many copies held by modifier stores share one allocation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Interned string identifier for stats.
///
/// # Examples
///
/// ```rust
/// use modcalc::StatId;
///
/// let life = StatId::new("Life");
/// let life2: StatId = "Life".into();
/// assert_eq!(life, life2);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatId(Arc<str>);

impl Serialize for StatId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatId::from(s))
    }
}

impl StatId {
    /// Create a new `StatId` from a string slice.
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Build a stat name from free text by PascalCasing its words.
    ///
    /// Used for stats the parser recognises structurally but cannot find in
    /// its phrase table.
    ///
    /// ```rust
    /// use modcalc::StatId;
    ///
    /// assert_eq!(StatId::synthesize("chance to blind").as_str(), "ChanceToBlind");
    /// assert_eq!(StatId::synthesize("  totem-placement speed ").as_str(), "TotemPlacementSpeed");
    /// ```
    pub fn synthesize(text: &str) -> Self {
        Self::from(pascal_case(text))
    }

    /// Get the string representation of this `StatId`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// PascalCase the alphanumeric words of `text`.
pub(crate) fn pascal_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

impl From<&str> for StatId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StatId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
