// ARC-89 Asset Metadata Record codec
//
// The on-chain record is a single box keyed by asset id:
// header (51 bytes) followed by the JSON body.
//
// Module Structure:
// - flags: reversible / irreversible flag bytes
// - body: JSON payload, chunking and paging
// - header: identifiers byte and header wire layout
// - hash: header, page and metadata hashes
// - mbr: minimum balance requirement deltas
// - record: write-side metadata and verified read-side record

mod body;
mod flags;
mod hash;
mod header;
mod mbr;
mod record;

pub use body::*;
pub use flags::*;
pub use hash::*;
pub use header::*;
pub use mbr::*;
pub use record::*;
