//! Pull-based record sources.
//!
//! [`RecordSource`] is a lending interface: the record returned by
//! `next_record` borrows the source, so it cannot outlive the next pull. This
//! is what lets [`BamSource`] and [`HtsSource`] decode every record into the
//! same buffer.

use crate::alignment::Alignment;
use noodles::bam;
use std::io::{self, Read};

pub trait RecordSource {
    type Record<'a>: Alignment
    where
        Self: 'a;

    /// Pull the next record, or `None` once the source is drained.
    fn next_record(&mut self) -> Option<io::Result<Self::Record<'_>>>;
}

/// Adapts an iterator of owned records.
#[derive(Debug, Clone)]
pub struct Records<I> {
    inner: I,
}

impl<I> Records<I> {
    pub fn new<T>(iter: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            inner: iter.into_iter(),
        }
    }
}

impl<I, A> RecordSource for Records<I>
where
    I: Iterator<Item = io::Result<A>>,
    A: Alignment,
{
    type Record<'a>
        = A
    where
        Self: 'a;

    fn next_record(&mut self) -> Option<io::Result<A>> {
        self.inner.next()
    }
}

/// Infallible records, e.g. a `Vec<EagerAlignment>`.
pub fn from_records<T, A>(
    records: T,
) -> Records<std::iter::Map<T::IntoIter, fn(A) -> io::Result<A>>>
where
    T: IntoIterator<Item = A>,
    A: Alignment,
{
    Records::new(records.into_iter().map(Ok as fn(A) -> io::Result<A>))
}

/// Reads a BAM stream with noodles, reusing one record buffer.
pub struct BamSource<R> {
    reader: bam::io::Reader<R>,
    record: bam::Record,
}

impl<R: Read> BamSource<R> {
    /// Wrap a reader whose header has already been read.
    pub fn new(reader: bam::io::Reader<R>) -> Self {
        Self {
            reader,
            record: bam::Record::default(),
        }
    }

    pub fn into_inner(self) -> bam::io::Reader<R> {
        self.reader
    }
}

impl<R: Read> RecordSource for BamSource<R> {
    type Record<'a>
        = &'a bam::Record
    where
        Self: 'a;

    fn next_record(&mut self) -> Option<io::Result<&bam::Record>> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(Ok(&self.record)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Reads SAM/BAM/CRAM through htslib, reusing one record buffer.
pub struct HtsSource<R> {
    reader: R,
    record: rust_htslib::bam::Record,
}

impl<R: rust_htslib::bam::Read> HtsSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            record: rust_htslib::bam::Record::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: rust_htslib::bam::Read> RecordSource for HtsSource<R> {
    type Record<'a>
        = &'a rust_htslib::bam::Record
    where
        Self: 'a;

    fn next_record(&mut self) -> Option<io::Result<&rust_htslib::bam::Record>> {
        match self.reader.read(&mut self.record)? {
            Ok(()) => Some(Ok(&self.record)),
            Err(e) => Some(Err(io::Error::other(e))),
        }
    }
}
