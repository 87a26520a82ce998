//! Error types for the pileup engine.

use crate::eager::Locus;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PileupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed CIGAR in read {name} at {locus}: {reason}")]
    MalformedCigar {
        name: String,
        locus: Locus,
        reason: String,
    },

    #[error("unsorted input: read {name} at {locus} follows a read at {previous}")]
    Unsorted {
        name: String,
        locus: Locus,
        previous: Locus,
    },

    /// A cursor ran off the end of its CIGAR while still inside the window.
    /// Eviction should always happen first, so this is a bug, not bad input.
    #[error("pileup cursor for read {name} exhausted at {locus}")]
    CursorExhausted { name: String, locus: Locus },
}

impl PileupError {
    /// Whether the offending record can be dropped and the pileup continued.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PileupError::MalformedCigar { .. } | PileupError::Unsorted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PileupError>;

pub(crate) fn display_name(name: Option<&[u8]>) -> String {
    name.map(|name| String::from_utf8_lossy(name).into_owned())
        .unwrap_or_else(|| "*".to_string())
}
