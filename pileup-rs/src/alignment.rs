//! Read-only access to an alignment record, whatever decoder produced it.
//!
//! Records handed out by a [`RecordSource`](crate::source::RecordSource) may
//! live in a buffer that the source overwrites on the next pull. The copy-out
//! methods (`read_cigar`, `read_sequence`, `read_quality_scores`) exist so the
//! engine can take an owned snapshot before that happens.

use crate::cigar::{Cigar, CigarOp};
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::RecordBuf;
use noodles::bam;
use rust_htslib::bam::record::Cigar as HtsCigar;
use std::io;

const MISSING_MAPPING_QUALITY: u8 = 255;
// BAM encodes an absent QUAL field as 0xff in every byte.
const MISSING_QUALITY: u8 = 0xff;

pub trait Alignment {
    /// Read name, without the trailing NUL.
    fn name(&self) -> Option<&[u8]>;

    fn flags(&self) -> Flags;

    /// Mapping quality; `None` when the record stores the missing value (255).
    fn mapping_quality(&self) -> Option<u8>;

    fn reference_sequence_id(&self) -> Option<io::Result<usize>>;

    /// 0-based leftmost reference coordinate.
    fn alignment_start(&self) -> Option<io::Result<u64>>;

    /// Replace the contents of `dst` with this record's CIGAR.
    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()>;

    /// Replace the contents of `dst` with the read bases (ASCII).
    fn read_sequence(&self, dst: &mut Vec<u8>);

    /// Replace the contents of `dst` with the Phred base qualities.
    fn read_quality_scores(&self, dst: &mut Vec<u8>);
}

impl<A: Alignment + ?Sized> Alignment for &A {
    fn name(&self) -> Option<&[u8]> {
        (**self).name()
    }

    fn flags(&self) -> Flags {
        (**self).flags()
    }

    fn mapping_quality(&self) -> Option<u8> {
        (**self).mapping_quality()
    }

    fn reference_sequence_id(&self) -> Option<io::Result<usize>> {
        (**self).reference_sequence_id()
    }

    fn alignment_start(&self) -> Option<io::Result<u64>> {
        (**self).alignment_start()
    }

    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()> {
        (**self).read_cigar(dst)
    }

    fn read_sequence(&self, dst: &mut Vec<u8>) {
        (**self).read_sequence(dst)
    }

    fn read_quality_scores(&self, dst: &mut Vec<u8>) {
        (**self).read_quality_scores(dst)
    }
}

// noodles' lazily decoded BAM record. Fields are parsed out of the raw record
// buffer on access, so CIGAR decoding is fallible.
impl Alignment for bam::Record {
    fn name(&self) -> Option<&[u8]> {
        bam::Record::name(self).map(|name| &**name)
    }

    fn flags(&self) -> Flags {
        bam::Record::flags(self)
    }

    fn mapping_quality(&self) -> Option<u8> {
        bam::Record::mapping_quality(self).map(|mapq| mapq.get())
    }

    fn reference_sequence_id(&self) -> Option<io::Result<usize>> {
        bam::Record::reference_sequence_id(self)
    }

    fn alignment_start(&self) -> Option<io::Result<u64>> {
        bam::Record::alignment_start(self).map(|result| result.map(|pos| (pos.get() - 1) as u64))
    }

    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()> {
        dst.clear();
        for result in bam::Record::cigar(self).iter() {
            let op = result?;
            let len = u32::try_from(op.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "CIGAR op length overflow"))?;
            dst.add_operation(len, op.kind().into());
        }
        Ok(())
    }

    fn read_sequence(&self, dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend(bam::Record::sequence(self).iter());
    }

    fn read_quality_scores(&self, dst: &mut Vec<u8>) {
        dst.clear();
        let qual = bam::Record::quality_scores(self);
        if qual.as_ref().first() != Some(&MISSING_QUALITY) {
            dst.extend_from_slice(qual.as_ref());
        }
    }
}

impl Alignment for RecordBuf {
    fn name(&self) -> Option<&[u8]> {
        RecordBuf::name(self).map(|name| &**name)
    }

    fn flags(&self) -> Flags {
        RecordBuf::flags(self)
    }

    fn mapping_quality(&self) -> Option<u8> {
        RecordBuf::mapping_quality(self).map(|mapq| mapq.get())
    }

    fn reference_sequence_id(&self) -> Option<io::Result<usize>> {
        RecordBuf::reference_sequence_id(self).map(Ok)
    }

    fn alignment_start(&self) -> Option<io::Result<u64>> {
        RecordBuf::alignment_start(self).map(|pos| Ok((pos.get() - 1) as u64))
    }

    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()> {
        dst.clear();
        for op in RecordBuf::cigar(self).as_ref() {
            let len = u32::try_from(op.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "CIGAR op length overflow"))?;
            dst.add_operation(len, op.kind().into());
        }
        Ok(())
    }

    fn read_sequence(&self, dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend_from_slice(RecordBuf::sequence(self).as_ref());
    }

    fn read_quality_scores(&self, dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend_from_slice(RecordBuf::quality_scores(self).as_ref());
    }
}

impl Alignment for rust_htslib::bam::Record {
    fn name(&self) -> Option<&[u8]> {
        let qname = self.qname();
        // htslib stores a missing name as "*".
        if qname.is_empty() || qname == b"*" {
            None
        } else {
            Some(qname)
        }
    }

    fn flags(&self) -> Flags {
        Flags::from(rust_htslib::bam::Record::flags(self))
    }

    fn mapping_quality(&self) -> Option<u8> {
        let mapq = self.mapq();
        (mapq != MISSING_MAPPING_QUALITY).then_some(mapq)
    }

    fn reference_sequence_id(&self) -> Option<io::Result<usize>> {
        usize::try_from(self.tid()).ok().map(Ok)
    }

    fn alignment_start(&self) -> Option<io::Result<u64>> {
        u64::try_from(self.pos()).ok().map(Ok)
    }

    fn read_cigar(&self, dst: &mut Cigar) -> io::Result<()> {
        dst.clear();
        for op in self.cigar().iter() {
            let (len, op) = match *op {
                HtsCigar::Match(n) => (n, CigarOp::Match),
                HtsCigar::Ins(n) => (n, CigarOp::Ins),
                HtsCigar::Del(n) => (n, CigarOp::Del),
                HtsCigar::RefSkip(n) => (n, CigarOp::RefSkip),
                HtsCigar::SoftClip(n) => (n, CigarOp::SoftClip),
                HtsCigar::HardClip(n) => (n, CigarOp::HardClip),
                HtsCigar::Pad(n) => (n, CigarOp::Pad),
                HtsCigar::Equal(n) => (n, CigarOp::Equal),
                HtsCigar::Diff(n) => (n, CigarOp::Diff),
            };
            dst.add_operation(len, op);
        }
        Ok(())
    }

    fn read_sequence(&self, dst: &mut Vec<u8>) {
        dst.clear();
        dst.extend_from_slice(&self.seq().as_bytes());
    }

    fn read_quality_scores(&self, dst: &mut Vec<u8>) {
        dst.clear();
        let qual = self.qual();
        if qual.first() != Some(&MISSING_QUALITY) {
            dst.extend_from_slice(qual);
        }
    }
}
