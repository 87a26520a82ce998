use crate::cigar::{Cigar, CigarOp};

/// The cursor walked past the last CIGAR operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CursorExhausted;

/// Walk state over one CIGAR, positioned on a single reference base.
///
/// `op_index` always names a reference-consuming operation once the cursor is
/// built; query-only runs (S, I) are stepped over while their lengths are added
/// to `query_offset`, and H/P runs are stepped over without touching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CigarCursor {
    op_index: usize,
    offset_in_op: u32,
    // read bases consumed by the operations before `op_index`
    query_offset: usize,
    // reference bases consumed before the current one
    reference_offset: u64,
}

impl CigarCursor {
    /// Position a cursor on the first reference base of `cigar`.
    pub(crate) fn start(cigar: &Cigar) -> Result<Self, CursorExhausted> {
        let mut cursor = Self {
            op_index: 0,
            offset_in_op: 0,
            query_offset: 0,
            reference_offset: 0,
        };
        cursor.seek(cigar)?;
        Ok(cursor)
    }

    fn seek(&mut self, cigar: &Cigar) -> Result<(), CursorExhausted> {
        while let Some(&(len, op)) = cigar.ops.get(self.op_index) {
            if op.consumes_reference() && len > 0 {
                return Ok(());
            }
            if op.consumes_query() {
                self.query_offset += len as usize;
            }
            self.op_index += 1;
        }
        Err(CursorExhausted)
    }

    /// Move one reference base to the right.
    pub(crate) fn advance(&mut self, cigar: &Cigar) -> Result<(), CursorExhausted> {
        let &(len, op) = cigar.ops.get(self.op_index).ok_or(CursorExhausted)?;
        self.offset_in_op += 1;
        self.reference_offset += 1;
        if self.offset_in_op >= len {
            if op.consumes_query() {
                self.query_offset += len as usize;
            }
            self.op_index += 1;
            self.offset_in_op = 0;
            self.seek(cigar)?;
        }
        Ok(())
    }

    pub(crate) fn op(&self, cigar: &Cigar) -> (u32, CigarOp) {
        cigar.ops[self.op_index]
    }

    pub(crate) fn op_index(&self) -> usize {
        self.op_index
    }

    pub(crate) fn offset_in_op(&self) -> u32 {
        self.offset_in_op
    }

    pub(crate) fn reference_offset(&self) -> u64 {
        self.reference_offset
    }

    /// Offset into the read sequence, if the current operation aligns a base.
    pub(crate) fn query_position(&self, cigar: &Cigar) -> Option<usize> {
        let (_, op) = self.op(cigar);
        op.is_aligned()
            .then(|| self.query_offset + self.offset_in_op as usize)
    }
}
