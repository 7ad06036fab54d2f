//! Category processors.
//!
//! Each processor turns one category of build input into its own
//! [`ModDb`] by running the parser over the category's text with the
//! category's source attached. The environment assembler owns the stores
//! they return.

pub mod config;
pub mod items;
pub mod passives;
pub mod skills;

use crate::parser::{ModParser, ParseContext, SupportLevel};
use crate::store::ModDb;
use tracing::trace;

/// Parse `lines` into `store`. Returns how many lines were unsupported.
pub(crate) fn parse_into<'a>(
    parser: &ModParser,
    store: &mut ModDb,
    lines: impl IntoIterator<Item = &'a str>,
    ctx: &ParseContext,
) -> usize {
    let mut unsupported = 0;
    for line in lines {
        let result = parser.parse(line, ctx);
        if result.support == SupportLevel::Unsupported {
            trace!(line, source = %ctx.source, "unsupported modifier line");
            unsupported += 1;
        }
        store.add_all(result.mods);
    }
    unsupported
}
