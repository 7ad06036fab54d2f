//! Load-once parser holder.
//!
//! A `ParserCell` owns at most one compiled [`ModParser`]. The first caller
//! runs the loader while holding the cell lock, so callers arriving during
//! the load wait for it and share the result instead of loading again. A
//! failed load is remembered: later callers get the same error without
//! another attempt until the cell is cleared or reloaded.

use super::tables::ParserTables;
use super::ModParser;
use crate::error::CalcError;
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

enum CellState {
    Empty,
    Ready(Arc<ModParser>),
    Failed(CalcError),
}

/// Lazily initialised, shared-ownership parser holder.
pub struct ParserCell {
    state: Mutex<CellState>,
}

impl ParserCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CellState::Empty),
        }
    }

    /// Return the loaded parser, running `loader` if nothing has been
    /// attempted yet.
    pub fn get_or_load<F>(&self, loader: F) -> Result<Arc<ModParser>, CalcError>
    where
        F: FnOnce() -> Result<ModParser, CalcError>,
    {
        let mut state = self.state.lock();
        match &*state {
            CellState::Ready(parser) => return Ok(Arc::clone(parser)),
            CellState::Failed(err) => return Err(err.clone()),
            CellState::Empty => {}
        }
        Self::load_locked(&mut *state, loader)
    }

    /// The loaded parser, if a load has succeeded.
    pub fn get(&self) -> Option<Arc<ModParser>> {
        match &*self.state.lock() {
            CellState::Ready(parser) => Some(Arc::clone(parser)),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.lock(), CellState::Ready(_))
    }

    /// Forget the loaded parser or cached failure. Parsers already handed
    /// out stay valid.
    pub fn clear(&self) {
        *self.state.lock() = CellState::Empty;
    }

    /// Discard the current state and load again.
    pub fn reload<F>(&self, loader: F) -> Result<Arc<ModParser>, CalcError>
    where
        F: FnOnce() -> Result<ModParser, CalcError>,
    {
        let mut state = self.state.lock();
        *state = CellState::Empty;
        Self::load_locked(&mut *state, loader)
    }

    fn load_locked<F>(state: &mut CellState, loader: F) -> Result<Arc<ModParser>, CalcError>
    where
        F: FnOnce() -> Result<ModParser, CalcError>,
    {
        match loader() {
            Ok(parser) => {
                let parser = Arc::new(parser);
                debug!("parser tables loaded");
                *state = CellState::Ready(Arc::clone(&parser));
                Ok(parser)
            }
            Err(err) => {
                warn!(error = %err, "parser bootstrap failed");
                *state = CellState::Failed(err.clone());
                Err(err)
            }
        }
    }
}

impl Default for ParserCell {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED: LazyLock<ParserCell> = LazyLock::new(ParserCell::new);

/// The process-wide parser built from the bundled tables.
///
/// ```rust
/// use modcalc::parser::{registry::shared_parser, ParseContext};
///
/// let parser = shared_parser().unwrap();
/// let again = shared_parser().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&parser, &again));
/// assert!(parser.parse("+10 to maximum life", &ParseContext::default()).success);
/// ```
pub fn shared_parser() -> Result<Arc<ModParser>, CalcError> {
    SHARED.get_or_load(|| ModParser::new(ParserTables::builtin()?))
}

/// The cell behind [`shared_parser`].
pub fn shared_cell() -> &'static ParserCell {
    &SHARED
}
