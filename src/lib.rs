//! # modcalc - Modifier Resolution Engine for ARPG Build Calculators
//!
//! Turns free-text game modifiers and a player's build into queryable,
//! explainable stat values:
//! - **Data-driven parsing** of modifier lines through pattern and phrase
//!   tables, with a pre-parsed cache for known lines
//! - **Order-of-operations aggregation** (BASE, INC, MORE, OVERRIDE) with
//!   flag, keyword, condition and slot filtering
//! - **Dependency-aware resolution** with attribute bonuses, cycle
//!   tolerance and full breakdowns
//! - **Damage conversion** in the fixed damage-type order
//! - **Incremental environments** that rebuild only what changed
//!
//! ## Core Concepts
//!
//! ```text
//! text ─[ModParser]→ Mod ─[ModDb]→ sum / more / override ─[StatResolver]→ ResolvedStat
//! ```
//!
//! A [`BuildSpec`](build::BuildSpec) is processed category by category
//! into stores, which an [`Environment`](environment::Environment)
//! flattens into a single player store.
//!
//! ## Example
//!
//! ```rust
//! use modcalc::*;
//! use modcalc::parser::{ModParser, ParseContext, tables::ParserTables};
//! use std::sync::Arc;
//!
//! let parser = ModParser::new(ParserTables::builtin().unwrap()).unwrap();
//! let ctx = ParseContext::new(ModSource::new(SourceCategory::Item));
//!
//! let mut db = ModDb::new();
//! for line in ["+40 to maximum Life", "+60 to maximum Life", "25% increased maximum Life"] {
//!     db.add_all(parser.parse(line, &ctx).mods);
//! }
//!
//! let mut resolver = StatResolver::new(Arc::new(db));
//! let life = resolver.resolve(&StatId::new("Life"), None, None);
//! assert!((life.value - 125.0).abs() < 1e-9); // (40 + 60) * 1.25
//! assert_eq!(life.sources.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - Text-to-modifier parser and its tables
//! - [`modifier`] - Modifier records and conditions
//! - [`flags`] - Modifier and keyword flag sets
//! - [`store`] - Modifier store and aggregation
//! - [`context`] - Query context
//! - [`resolver`] - Stat resolver
//! - [`attributes`] - Attribute dependency rules
//! - [`resolved`] - Resolved stat results
//! - [`conversion`] - Damage conversion
//! - [`build`], [`config`], [`tree`] - Build inputs
//! - [`processors`] - Per-category store builders
//! - [`environment`] - Environment assembly and dirty flags
//! - [`error`] - Error types

pub mod attributes;
pub mod build;
pub mod config;
pub mod context;
pub mod conversion;
pub mod environment;
pub mod error;
pub mod flags;
pub mod modifier;
pub mod parser;
pub mod processors;
pub mod resolved;
pub mod resolver;
pub mod stat_id;
pub mod store;
pub mod tree;

// Re-export main types for convenience
pub use context::QueryContext;
pub use error::CalcError;
pub use flags::{KeywordFlags, ModFlags};
pub use modifier::{Condition, Mod, ModKind, ModSource, ModTag, ModValue, SourceCategory};
pub use parser::{ModParser, ParseContext, ParseResult, SupportLevel};
pub use resolved::{BreakdownEntry, ResolvedStat};
pub use resolver::StatResolver;
pub use stat_id::StatId;
pub use store::ModDb;
