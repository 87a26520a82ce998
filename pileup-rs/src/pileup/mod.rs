//! The pileup engine: a sliding window of reads over the reference axis.
//!
//! [`Pileup`] pulls records from a position-sorted
//! [`RecordSource`](crate::source::RecordSource) and yields one
//! [`PileupColumn`] per reference base. Each column exposes the reads covering
//! that base as [`PileupRead`]s, whose `base()`, `quality()` and
//! `read_sequence_offset()` project the read onto the column.

mod column;
mod cursor;
mod engine;
mod read;

pub use column::{BaseCounts, PileupColumn};
pub use engine::{ErrorPolicy, Pileup, PileupOptions, PileupStats};
pub use read::{GAP_BASE, Indel, MISSING_QUALITY, PileupRead};
