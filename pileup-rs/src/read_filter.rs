//! Read filtering predicates applied before a record enters the pileup.
//!
//! The main trait is [`ReadFilter`]. [`DefaultReadFilter`] rejects reads by
//! mapping quality and SAM flags, the same checks `samtools mpileup` applies by
//! default. Filters compose with [`ReadFilter::and`], and any
//! `Fn(&dyn Alignment) -> bool` closure is a filter.

use crate::alignment::Alignment;
use noodles::sam::alignment::record::Flags;

pub trait ReadFilter {
    /// `true` if the read passes the filter.
    fn filter_read(&self, read: &dyn Alignment) -> bool;

    /// A filter passing only reads that pass both `self` and `other`.
    fn and<B: ReadFilter>(self, other: B) -> And<Self, B>
    where
        Self: Sized,
    {
        And(self, other)
    }
}

impl<F> ReadFilter for F
where
    F: Fn(&dyn Alignment) -> bool,
{
    #[inline(always)]
    fn filter_read(&self, read: &dyn Alignment) -> bool {
        self(read)
    }
}

/// Passes every read.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ReadFilter for AcceptAll {
    #[inline(always)]
    fn filter_read(&self, _read: &dyn Alignment) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

impl<A: ReadFilter, B: ReadFilter> ReadFilter for And<A, B> {
    #[inline(always)]
    fn filter_read(&self, read: &dyn Alignment) -> bool {
        self.0.filter_read(read) && self.1.filter_read(read)
    }
}

/// Filters on minimum mapping quality and excluded flags.
#[derive(Debug, Clone, Copy)]
pub struct DefaultReadFilter {
    /// The read's mapping quality must be greater than or equal to this value
    /// to pass. A missing mapping quality only passes a threshold of 0.
    min_mapq: u8,
    /// Reads with any of these flags set fail.
    exclude_flags: Flags,
}

impl DefaultReadFilter {
    /// Unmapped, secondary, QC-fail and duplicate reads (0x704).
    pub const DEFAULT_EXCLUDE_FLAGS: Flags = Flags::UNMAPPED
        .union(Flags::SECONDARY)
        .union(Flags::QC_FAIL)
        .union(Flags::DUPLICATE);

    pub fn new(min_mapq: u8) -> Self {
        Self {
            min_mapq,
            exclude_flags: Self::DEFAULT_EXCLUDE_FLAGS,
        }
    }

    pub fn with_exclude_flags(mut self, exclude_flags: Flags) -> Self {
        self.exclude_flags = exclude_flags;
        self
    }
}

impl Default for DefaultReadFilter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ReadFilter for DefaultReadFilter {
    #[inline(always)]
    fn filter_read(&self, read: &dyn Alignment) -> bool {
        if read.flags().intersects(self.exclude_flags) {
            return false;
        }
        match read.mapping_quality() {
            Some(mapq) => mapq >= self.min_mapq,
            None => self.min_mapq == 0,
        }
    }
}
