use super::cursor::{CigarCursor, CursorExhausted};
use crate::cigar::CigarOp;
use crate::eager::EagerAlignment;

/// Base reported for deletions and reference skips.
pub const GAP_BASE: u8 = b'N';

/// Quality reported when there is no read base, or the record has no QUAL.
pub const MISSING_QUALITY: u8 = 255;

/// An indel that starts immediately after the current base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indel {
    None,
    Insertion(u32),
    Deletion(u32),
}

/// One read in the active window: the owned snapshot plus its column cursor.
///
/// The engine moves the cursor exactly one reference base per column, so a
/// `PileupRead` seen through a column always describes that column's base.
#[derive(Debug, Clone)]
pub struct PileupRead {
    alignment: EagerAlignment,
    cursor: CigarCursor,
}

impl PileupRead {
    pub(crate) fn new(alignment: EagerAlignment) -> Result<Self, CursorExhausted> {
        let cursor = CigarCursor::start(alignment.cigar())?;
        Ok(Self { alignment, cursor })
    }

    pub(crate) fn advance(&mut self) -> Result<(), CursorExhausted> {
        self.cursor.advance(self.alignment.cigar())
    }

    pub fn alignment(&self) -> &EagerAlignment {
        &self.alignment
    }

    /// The CIGAR run under the current column, as `(length, op)`.
    pub fn cigar_op(&self) -> (u32, CigarOp) {
        self.cursor.op(self.alignment.cigar())
    }

    /// Offset into the read sequence, or `None` over a deletion or skip.
    pub fn read_sequence_offset(&self) -> Option<usize> {
        self.cursor.query_position(self.alignment.cigar())
    }

    /// The read base at this column; `N` over a deletion or skip.
    pub fn base(&self) -> u8 {
        self.read_sequence_offset()
            .and_then(|i| self.alignment.sequence().get(i).copied())
            .unwrap_or(GAP_BASE)
    }

    /// Phred quality of [`base`](Self::base); 255 when there is none.
    pub fn quality(&self) -> u8 {
        self.read_sequence_offset()
            .and_then(|i| self.alignment.quality_scores().get(i).copied())
            .unwrap_or(MISSING_QUALITY)
    }

    /// Reference coordinate this read is currently positioned on.
    pub fn reference_position(&self) -> u64 {
        self.alignment.position() + self.cursor.reference_offset()
    }

    pub fn is_deletion(&self) -> bool {
        self.cigar_op().1 == CigarOp::Del
    }

    pub fn is_reference_skip(&self) -> bool {
        self.cigar_op().1 == CigarOp::RefSkip
    }

    pub fn is_head(&self) -> bool {
        self.cursor.reference_offset() == 0
    }

    pub fn is_tail(&self) -> bool {
        self.reference_position() + 1 == self.alignment.end_position()
    }

    /// Insertion or deletion following this base, as htslib reports it: only
    /// on the last base of an aligned run, looking past any padding.
    pub fn indel(&self) -> Indel {
        let (len, op) = self.cigar_op();
        if !op.is_aligned() || self.cursor.offset_in_op() + 1 != len {
            return Indel::None;
        }
        let next = self.alignment.cigar().ops[self.cursor.op_index() + 1..]
            .iter()
            .find(|(_, op)| *op != CigarOp::Pad);
        match next {
            Some(&(len, CigarOp::Ins)) => Indel::Insertion(len),
            Some(&(len, CigarOp::Del)) => Indel::Deletion(len),
            _ => Indel::None,
        }
    }
}
