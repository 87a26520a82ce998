//! pileup-rs: streaming per-base pileups over position-sorted alignments.
//!
//! # Library usage
//!
//! ```no_run
//! use pileup_rs::{Pileup, PileupOptions};
//! use pileup_rs::read_filter::DefaultReadFilter;
//! use pileup_rs::source::BamSource;
//! use noodles::bam;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut reader = bam::io::reader::Builder.build_from_path("sample.bam")?;
//! reader.read_header()?;
//!
//! let source = BamSource::new(reader);
//! let filter = DefaultReadFilter::new(20);
//! let mut pileup = Pileup::with_filter(source, filter, PileupOptions::default());
//!
//! while let Some(column) = pileup.next_column()? {
//!     for read in column.reads() {
//!         let _ = (read.base(), read.quality(), read.read_sequence_offset());
//!     }
//!     println!("{}\t{}", column.position(), column.coverage());
//! }
//! # Ok(())
//! # }
//! ```

pub mod alignment;
pub mod cigar;
pub mod eager;
pub mod error;
pub mod pileup;
pub mod read_filter;
pub mod source;

// Flat re-exports for the most commonly used public types.
pub use alignment::Alignment;
pub use cigar::{Cigar, CigarOp, ParseCigarError};
pub use eager::{EagerAlignment, Locus};
pub use error::{PileupError, Result};
pub use pileup::{
    BaseCounts, ErrorPolicy, Indel, Pileup, PileupColumn, PileupOptions, PileupRead, PileupStats,
};
