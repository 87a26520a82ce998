use super::read::{Indel, PileupRead};
use crate::eager::Locus;

/// The reads overlapping one reference base.
///
/// A column borrows the engine's window and is valid until the next call to
/// [`Pileup::next_column`](super::Pileup::next_column).
#[derive(Debug, Clone, Copy)]
pub struct PileupColumn<'a> {
    locus: Locus,
    reads: &'a [PileupRead],
}

impl<'a> PileupColumn<'a> {
    pub(crate) fn new(locus: Locus, reads: &'a [PileupRead]) -> Self {
        Self { locus, reads }
    }

    pub fn locus(&self) -> Locus {
        self.locus
    }

    pub fn reference_sequence_id(&self) -> Option<usize> {
        self.locus.reference_sequence_id
    }

    /// 0-based reference coordinate.
    pub fn position(&self) -> u64 {
        self.locus.position
    }

    /// Number of reads overlapping this base, deletions and skips included.
    pub fn coverage(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Reads in admission order.
    pub fn reads(&self) -> &'a [PileupRead] {
        self.reads
    }

    /// Tally bases, indels and skips across the column.
    ///
    /// Bases with a quality below `min_base_quality` are counted as `N`.
    pub fn base_counts(&self, min_base_quality: Option<u8>) -> BaseCounts {
        let mut counts = BaseCounts::default();
        for read in self.reads {
            counts.add(read, min_base_quality);
        }
        counts
    }
}

/// Per-column nucleotide and indel counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseCounts {
    /// Reads overlapping the base, excluding reference skips.
    pub depth: u32,
    pub a: u32,
    pub c: u32,
    pub g: u32,
    pub t: u32,
    /// Any unrecognized or low-quality base.
    pub n: u32,
    pub del: u32,
    /// Insertions starting to the right of this base. Does not count toward depth.
    pub ins: u32,
    /// Does not count toward depth.
    pub ref_skip: u32,
}

impl BaseCounts {
    fn add(&mut self, read: &PileupRead, min_base_quality: Option<u8>) {
        // is_reference_skip has to be checked before anything touches the base
        if read.is_reference_skip() {
            self.ref_skip += 1;
            return;
        }
        self.depth += 1;
        if read.is_deletion() {
            self.del += 1;
            return;
        }

        let is_low_qual = min_base_quality.is_some_and(|cutoff| read.quality() < cutoff);
        if is_low_qual {
            self.n += 1;
        } else {
            match read.base().to_ascii_uppercase() {
                b'A' => self.a += 1,
                b'C' => self.c += 1,
                b'G' => self.g += 1,
                b'T' => self.t += 1,
                _ => self.n += 1,
            }
        }

        if let Indel::Insertion(_) = read.indel() {
            self.ins += 1;
        }
    }
}
