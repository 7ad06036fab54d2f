//! Item slot stores.

use super::parse_into;
use crate::build::{Item, SlotKey};
use crate::modifier::{ModSource, SourceCategory};
use crate::parser::{ModParser, ParseContext};
use crate::store::ModDb;
use tracing::trace;

/// Parse an equipped item's implicit and explicit lines. Local lines are
/// tagged with the slot name.
pub fn build_slot_store(parser: &ModParser, key: &SlotKey, item: &Item) -> ModDb {
    let ctx = ParseContext::new(ModSource::with_id(SourceCategory::Item, item.id.clone()))
        .with_slot(key.slot.clone());
    let mut store = ModDb::new();
    let unsupported = parse_into(parser, &mut store, item.lines(), &ctx);
    trace!(slot = %key, mods = store.len(), unsupported, "built item slot store");
    store
}
