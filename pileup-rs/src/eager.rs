//! Owned alignment snapshots.
//!
//! An [`EagerAlignment`] is a value copy of every field the pileup needs from a
//! transient source record. It is taken once, when the record is pulled, so
//! that the source is free to reuse its decode buffer for the next record.

use crate::alignment::Alignment;
use crate::cigar::Cigar;
use crate::error::{display_name, PileupError, Result};
use noodles::sam::alignment::record::Flags;
use std::fmt;
use std::io;

/// A reference coordinate: reference sequence index plus 0-based position.
///
/// Loci order by reference first, which is the order of a coordinate-sorted
/// BAM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locus {
    pub reference_sequence_id: Option<usize>,
    pub position: u64,
}

impl Locus {
    pub fn new(reference_sequence_id: Option<usize>, position: u64) -> Self {
        Self {
            reference_sequence_id,
            position,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference_sequence_id {
            Some(id) => write!(f, "{}:{}", id, self.position),
            None => write!(f, "*:{}", self.position),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EagerAlignment {
    name: Option<Vec<u8>>,
    flags: Flags,
    mapping_quality: Option<u8>,
    reference_sequence_id: Option<usize>,
    position: u64,
    end_position: u64,
    cigar: Cigar,
    sequence: Vec<u8>,
    quality_scores: Vec<u8>,
}

impl EagerAlignment {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Copy a record out of its source.
    ///
    /// Returns `Ok(None)` for records without an alignment start (unplaced
    /// reads), which can never occupy a column.
    pub fn capture<A: Alignment + ?Sized>(record: &A) -> Result<Option<Self>> {
        let Some(start) = record.alignment_start() else {
            return Ok(None);
        };
        let position = start?;
        let reference_sequence_id = record.reference_sequence_id().transpose()?;
        let name = record.name().map(<[u8]>::to_vec);
        let locus = Locus::new(reference_sequence_id, position);

        let mut cigar = Cigar::default();
        record
            .read_cigar(&mut cigar)
            .map_err(|e| malformed(name.as_deref(), locus, e.to_string()))?;

        let mut sequence = Vec::new();
        record.read_sequence(&mut sequence);
        let mut quality_scores = Vec::new();
        record.read_quality_scores(&mut quality_scores);

        let alignment = Self::from_parts(
            name,
            record.flags(),
            record.mapping_quality(),
            reference_sequence_id,
            position,
            cigar,
            sequence,
            quality_scores,
        );
        alignment.validate()?;
        Ok(Some(alignment))
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        name: Option<Vec<u8>>,
        flags: Flags,
        mapping_quality: Option<u8>,
        reference_sequence_id: Option<usize>,
        position: u64,
        cigar: Cigar,
        sequence: Vec<u8>,
        quality_scores: Vec<u8>,
    ) -> Self {
        // overflow is reported by validate()
        let end_position = position.saturating_add(cigar.reference_len());
        Self {
            name,
            flags,
            mapping_quality,
            reference_sequence_id,
            position,
            end_position,
            cigar,
            sequence,
            quality_scores,
        }
    }

    // The cursor indexes the sequence by query offset, so the CIGAR must
    // account for exactly the stored bases. An absent sequence ("*") is allowed.
    // Zero-span records never reach a cursor; a placed unmapped mate (CIGAR "*"
    // with bases) is one of them.
    fn validate(&self) -> Result<()> {
        if self.position.checked_add(self.cigar.reference_len()).is_none() {
            return Err(malformed(
                self.name(),
                self.locus(),
                format!("CIGAR {} runs past the end of the coordinate space", self.cigar),
            ));
        }
        if self.is_zero_span() {
            return Ok(());
        }

        let query_len = self.cigar.query_len();
        if !self.sequence.is_empty() && self.sequence.len() as u64 != query_len {
            return Err(malformed(
                self.name(),
                self.locus(),
                format!(
                    "CIGAR {} consumes {} read bases but the sequence has {}",
                    self.cigar,
                    query_len,
                    self.sequence.len()
                ),
            ));
        }
        if !self.quality_scores.is_empty() && self.quality_scores.len() != self.sequence.len() {
            return Err(malformed(
                self.name(),
                self.locus(),
                format!(
                    "{} quality scores for {} bases",
                    self.quality_scores.len(),
                    self.sequence.len()
                ),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn mapping_quality(&self) -> Option<u8> {
        self.mapping_quality
    }

    pub fn reference_sequence_id(&self) -> Option<usize> {
        self.reference_sequence_id
    }

    /// 0-based leftmost reference coordinate.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 0-based, exclusive end of the reference span.
    pub fn end_position(&self) -> u64 {
        self.end_position
    }

    pub fn locus(&self) -> Locus {
        Locus::new(self.reference_sequence_id, self.position)
    }

    pub fn cigar(&self) -> &Cigar {
        &self.cigar
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn quality_scores(&self) -> &[u8] {
        &self.quality_scores
    }

    /// True when no CIGAR operation consumes the reference.
    pub fn is_zero_span(&self) -> bool {
        self.end_position == self.position
    }
}

fn malformed(name: Option<&[u8]>, locus: Locus, reason: String) -> PileupError {
    PileupError::MalformedCigar {
        name: display_name(name),
        locus,
        reason,
    }
}

impl Alignment for EagerAlignment {
    fn name(&self) -> Option<&[u8]> {
        EagerAlignment::name(self)
    }

    fn flags(&self) -> Flags {
        self.flags
    }

    fn mapping_quality(&self) -> Option<u8> {
        self.mapping_quality
    }

    fn reference_sequence_id(&self) -> Option<io::Result<usize>> {
        self.reference_sequence_id.map(Ok)
    }

    fn alignment_start(&self) -> Option<io::Result<u64>> {
        Some(Ok(self.position))
    }

    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()> {
        dst.clone_from(&self.cigar);
        Ok(())
    }

    fn read_sequence(&self, dst: &mut Vec<u8>) {
        dst.clone_from(&self.sequence);
    }

    fn read_quality_scores(&self, dst: &mut Vec<u8>) {
        dst.clone_from(&self.quality_scores);
    }
}

/// Assembles an [`EagerAlignment`] field by field.
///
/// No validation happens here; consistency between CIGAR, sequence and
/// qualities is checked when the pileup captures the record.
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<Vec<u8>>,
    flags: Flags,
    mapping_quality: Option<u8>,
    reference_sequence_id: Option<usize>,
    position: u64,
    cigar: Cigar,
    sequence: Vec<u8>,
    quality_scores: Vec<u8>,
}

impl Builder {
    pub fn set_name<N: Into<Vec<u8>>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn set_mapping_quality(mut self, mapping_quality: u8) -> Self {
        self.mapping_quality = Some(mapping_quality);
        self
    }

    pub fn set_reference_sequence_id(mut self, id: usize) -> Self {
        self.reference_sequence_id = Some(id);
        self
    }

    pub fn set_position(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    pub fn set_cigar(mut self, cigar: Cigar) -> Self {
        self.cigar = cigar;
        self
    }

    pub fn set_sequence<S: Into<Vec<u8>>>(mut self, sequence: S) -> Self {
        self.sequence = sequence.into();
        self
    }

    pub fn set_quality_scores<Q: Into<Vec<u8>>>(mut self, quality_scores: Q) -> Self {
        self.quality_scores = quality_scores.into();
        self
    }

    pub fn build(self) -> EagerAlignment {
        EagerAlignment::from_parts(
            self.name,
            self.flags,
            self.mapping_quality,
            self.reference_sequence_id,
            self.position,
            self.cigar,
            self.sequence,
            self.quality_scores,
        )
    }
}
