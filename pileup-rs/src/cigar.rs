//! CIGAR edit scripts and their reference/query consumption rules.

use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CigarOp {
    #[default]
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Pad,
    Equal,
    Diff,
}

impl CigarOp {
    /// M, D, N, = and X advance the reference coordinate.
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }

    /// M, I, S, = and X advance the read sequence offset.
    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    /// True for the operations that put a read base on a reference base.
    pub fn is_aligned(self) -> bool {
        self.consumes_reference() && self.consumes_query()
    }

    pub fn as_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Pad => 'P',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        let op = match c {
            'M' => CigarOp::Match,
            'I' => CigarOp::Ins,
            'D' => CigarOp::Del,
            'N' => CigarOp::RefSkip,
            'S' => CigarOp::SoftClip,
            'H' => CigarOp::HardClip,
            'P' => CigarOp::Pad,
            '=' => CigarOp::Equal,
            'X' => CigarOp::Diff,
            _ => return None,
        };
        Some(op)
    }
}

impl From<CigarKind> for CigarOp {
    fn from(kind: CigarKind) -> Self {
        match kind {
            CigarKind::Match => CigarOp::Match,
            CigarKind::Insertion => CigarOp::Ins,
            CigarKind::Deletion => CigarOp::Del,
            CigarKind::Skip => CigarOp::RefSkip,
            CigarKind::SoftClip => CigarOp::SoftClip,
            CigarKind::HardClip => CigarOp::HardClip,
            CigarKind::Pad => CigarOp::Pad,
            CigarKind::SequenceMatch => CigarOp::Equal,
            CigarKind::SequenceMismatch => CigarOp::Diff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCigarError {
    #[error("empty CIGAR string")]
    Empty,
    #[error("missing length before '{op}' in CIGAR '{cigar}'")]
    MissingLength { op: char, cigar: String },
    #[error("invalid length in CIGAR '{cigar}'")]
    InvalidLength { cigar: String },
    #[error("unknown CIGAR operation '{op}' in '{cigar}'")]
    UnknownOp { op: char, cigar: String },
    #[error("CIGAR '{cigar}' ends without an operation")]
    TrailingLength { cigar: String },
}

/// An ordered list of `(length, operation)` pairs.
///
/// Zero-length operations are dropped on insertion and adjacent operations of
/// the same kind are merged, so every stored run has a positive length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    pub ops: Vec<(u32, CigarOp)>,
}

impl Cigar {
    pub fn add_operation(&mut self, len: u32, op: CigarOp) {
        if len == 0 {
            return;
        }
        if let Some((prev_len, prev_op)) = self.ops.last_mut()
            && *prev_op == op
        {
            *prev_len += len;
            return;
        }
        self.ops.push((len, op));
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, CigarOp)> {
        self.ops.iter()
    }

    /// Number of reference bases spanned by the alignment.
    pub fn reference_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_reference())
            .map(|(len, _)| u64::from(*len))
            .sum()
    }

    /// Number of read bases the alignment accounts for (hard clips excluded).
    pub fn query_len(&self) -> u64 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_query())
            .map(|(len, _)| u64::from(*len))
            .sum()
    }
}

impl FromIterator<(u32, CigarOp)> for Cigar {
    fn from_iter<I: IntoIterator<Item = (u32, CigarOp)>>(iter: I) -> Self {
        let mut cigar = Cigar::default();
        for (len, op) in iter {
            cigar.add_operation(len, op);
        }
        cigar
    }
}

impl FromStr for Cigar {
    type Err = ParseCigarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseCigarError::Empty);
        }
        if s == "*" {
            return Ok(Cigar::default());
        }

        let mut cigar = Cigar::default();
        let mut num_start = 0;
        for (i, c) in s.char_indices() {
            if c.is_ascii_digit() {
                continue;
            }
            let op = CigarOp::from_char(c).ok_or_else(|| ParseCigarError::UnknownOp {
                op: c,
                cigar: s.to_string(),
            })?;
            if num_start == i {
                return Err(ParseCigarError::MissingLength {
                    op: c,
                    cigar: s.to_string(),
                });
            }
            let len: u32 = s[num_start..i]
                .parse()
                .map_err(|_| ParseCigarError::InvalidLength { cigar: s.to_string() })?;
            cigar.add_operation(len, op);
            num_start = i + c.len_utf8();
        }
        if num_start != s.len() {
            return Err(ParseCigarError::TrailingLength { cigar: s.to_string() });
        }
        Ok(cigar)
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("*");
        }
        for (len, op) in &self.ops {
            write!(f, "{}{}", len, op.as_char())?;
        }
        Ok(())
    }
}
