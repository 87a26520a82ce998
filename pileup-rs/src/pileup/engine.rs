use super::column::PileupColumn;
use super::read::PileupRead;
use crate::eager::{EagerAlignment, Locus};
use crate::error::{display_name, PileupError, Result};
use crate::read_filter::{AcceptAll, ReadFilter};
use crate::source::RecordSource;

/// What to do with a record that is malformed or out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the error and stop the pileup.
    #[default]
    Fail,
    /// Log the record, count it in [`PileupStats::skipped`] and keep going.
    Skip,
}

#[derive(Debug, Clone)]
pub struct PileupOptions {
    pub on_error: ErrorPolicy,
    /// Emit zero-coverage columns between reads on the same reference instead
    /// of jumping straight to the next read.
    pub fill_gaps: bool,
}

impl Default for PileupOptions {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::Fail,
            fill_gaps: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PileupStats {
    /// Records pulled from the source.
    pub records: u64,
    /// Records rejected by the read filter.
    pub filtered: u64,
    /// Records without an alignment start.
    pub unplaced: u64,
    /// Records whose CIGAR consumes no reference bases.
    pub zero_span: u64,
    /// Records dropped under [`ErrorPolicy::Skip`].
    pub skipped: u64,
    /// Records that entered the window.
    pub admitted: u64,
    pub columns: u64,
}

/// Streaming pileup over a position-sorted record source.
///
/// Columns are produced one reference base at a time by
/// [`next_column`](Self::next_column). Records are copied into owned
/// [`EagerAlignment`]s as they are pulled, held in a single look-ahead slot
/// until the column position reaches them, and dropped once the column moves
/// past their end.
pub struct Pileup<S, F = AcceptAll> {
    source: S,
    filter: F,
    options: PileupOptions,
    lookahead: Option<EagerAlignment>,
    source_done: bool,
    active: Vec<PileupRead>,
    locus: Option<Locus>,
    last_pulled: Option<Locus>,
    done: bool,
    stats: PileupStats,
}

impl<S: RecordSource> Pileup<S> {
    pub fn new(source: S, options: PileupOptions) -> Self {
        Self::with_filter(source, AcceptAll, options)
    }
}

impl<S: RecordSource, F: ReadFilter> Pileup<S, F> {
    pub fn with_filter(source: S, filter: F, options: PileupOptions) -> Self {
        Self {
            source,
            filter,
            options,
            lookahead: None,
            source_done: false,
            active: Vec::new(),
            locus: None,
            last_pulled: None,
            done: false,
            stats: PileupStats::default(),
        }
    }

    pub fn stats(&self) -> &PileupStats {
        &self.stats
    }

    /// Number of reads currently in the window.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Produce the next column, or `None` once every read has been emitted.
    ///
    /// After an error is returned the pileup is finished and yields `None`.
    pub fn next_column(&mut self) -> Result<Option<PileupColumn<'_>>> {
        if self.done {
            return Ok(None);
        }
        match self.step() {
            Ok(Some(locus)) => {
                self.stats.columns += 1;
                Ok(Some(PileupColumn::new(locus, &self.active)))
            }
            Ok(None) => {
                self.done = true;
                self.active.clear();
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                self.active.clear();
                self.lookahead = None;
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<Option<Locus>> {
        self.fill_lookahead()?;

        let Some(current) = self.locus else {
            let Some(first) = self.lookahead.as_ref().map(EagerAlignment::locus) else {
                return Ok(None);
            };
            self.locus = Some(first);
            self.admit(first)?;
            return Ok(Some(first));
        };

        let next = Locus::new(current.reference_sequence_id, current.position + 1);
        self.active
            .retain(|read| read.alignment().end_position() > next.position);

        let locus = if self.active.is_empty() {
            match self.lookahead.as_ref().map(EagerAlignment::locus) {
                None => return Ok(None),
                Some(pending)
                    if self.options.fill_gaps
                        && pending.reference_sequence_id == next.reference_sequence_id =>
                {
                    next
                }
                Some(pending) => pending,
            }
        } else {
            for read in &mut self.active {
                read.advance().map_err(|_| PileupError::CursorExhausted {
                    name: display_name(read.alignment().name()),
                    locus: next,
                })?;
                debug_assert_eq!(read.reference_position(), next.position);
            }
            next
        };

        self.locus = Some(locus);
        self.admit(locus)?;
        Ok(Some(locus))
    }

    // Move every pending record that starts at `locus` into the window.
    fn admit(&mut self, locus: Locus) -> Result<()> {
        loop {
            self.fill_lookahead()?;
            match self.lookahead.take() {
                Some(alignment) if alignment.locus() == locus => {
                    let name = display_name(alignment.name());
                    let read = PileupRead::new(alignment).map_err(|_| {
                        PileupError::MalformedCigar {
                            name,
                            locus,
                            reason: "no reference-consuming operation".to_string(),
                        }
                    })?;
                    self.active.push(read);
                    self.stats.admitted += 1;
                }
                other => {
                    self.lookahead = other;
                    return Ok(());
                }
            }
        }
    }

    // Pull until the look-ahead slot holds an admissible record or the source
    // is drained. Each record is captured before the source is polled again.
    fn fill_lookahead(&mut self) -> Result<()> {
        while self.lookahead.is_none() && !self.source_done {
            let record = match self.source.next_record() {
                None => {
                    self.source_done = true;
                    break;
                }
                Some(result) => result?,
            };
            self.stats.records += 1;

            if !self.filter.filter_read(&record) {
                self.stats.filtered += 1;
                continue;
            }

            let captured = EagerAlignment::capture(&record);
            // releases the source's buffer
            drop(record);
            let alignment = match captured {
                Ok(Some(alignment)) => alignment,
                Ok(None) => {
                    self.stats.unplaced += 1;
                    continue;
                }
                Err(e) => {
                    self.handle_record_error(e)?;
                    continue;
                }
            };

            let locus = alignment.locus();
            if let Some(previous) = self.last_pulled
                && locus < previous
            {
                self.handle_record_error(PileupError::Unsorted {
                    name: display_name(alignment.name()),
                    locus,
                    previous,
                })?;
                continue;
            }
            self.last_pulled = Some(locus);

            if alignment.is_zero_span() {
                self.stats.zero_span += 1;
                continue;
            }
            self.lookahead = Some(alignment);
        }
        Ok(())
    }

    fn handle_record_error(&mut self, error: PileupError) -> Result<()> {
        match self.options.on_error {
            ErrorPolicy::Skip if error.is_recoverable() => {
                tracing::warn!(%error, "skipping record");
                self.stats.skipped += 1;
                Ok(())
            }
            _ => Err(error),
        }
    }
}
