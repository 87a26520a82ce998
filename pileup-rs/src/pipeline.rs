use crate::cli::Args;
use crate::fasta::FastaDb;
use crate::header::reference_names;
use anyhow::Result;
use crossfire::mpmc;
use noodles::bam;
use noodles::sam::alignment::record::Flags;
use pileup_rs::read_filter::{DefaultReadFilter, ReadFilter};
use pileup_rs::source::{BamSource, RecordSource, Records};
use pileup_rs::{ErrorPolicy, Pileup, PileupOptions, PileupStats};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::thread;

const PREFETCH_BATCH_RECORDS: usize = 4096;

const TSV_HEADER: &str = "#chrom\tpos\tref\tdepth\tA\tC\tG\tT\tN\tdel\tins\tref_skip";

struct Output<'a> {
    names: &'a [String],
    fasta: Option<&'a FastaDb>,
    min_baseq: Option<u8>,
}

pub fn run(args: &Args, fasta: Option<&FastaDb>) -> Result<PileupStats> {
    let mut reader = bam::io::reader::Builder.build_from_path(&args.in_bam)?;
    let header = reader.read_header()?;
    let names = reference_names(&header);

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(out);

    let filter = DefaultReadFilter::new(args.min_mapq)
        .with_exclude_flags(Flags::from(args.exclude_flags));
    let options = PileupOptions {
        on_error: if args.skip_invalid {
            ErrorPolicy::Skip
        } else {
            ErrorPolicy::Fail
        },
        fill_gaps: !args.no_gaps,
    };
    let output = Output {
        names: &names,
        fasta,
        min_baseq: args.min_baseq,
    };

    if args.threads > 1 {
        crossfire::detect_backoff_cfg();
        let cap = (args.threads as usize).saturating_mul(4).max(8);
        let (tx, rx) = mpmc::bounded_blocking::<io::Result<Vec<bam::Record>>>(cap);

        return thread::scope(|scope| -> Result<PileupStats> {
            let reader = &mut reader;
            scope.spawn(move || {
                loop {
                    let mut batch = Vec::with_capacity(PREFETCH_BATCH_RECORDS);
                    let message = read_batch(reader, &mut batch).map(|()| batch);
                    let last = !matches!(&message, Ok(batch) if batch.len() == PREFETCH_BATCH_RECORDS);
                    // the receiver is gone once the pileup has stopped
                    if tx.send(message).is_err() || last {
                        break;
                    }
                }
            });

            let batches = std::iter::from_fn(move || rx.recv().ok());
            let source = Records::new(batches.flat_map(unbatch));
            let pileup = Pileup::with_filter(source, filter, options);
            write_pileup(pileup, &output, &mut writer)
        });
    }

    let source = BamSource::new(reader);
    let pileup = Pileup::with_filter(source, filter, options);
    write_pileup(pileup, &output, &mut writer)
}

fn read_batch<R: Read>(
    reader: &mut bam::io::Reader<R>,
    batch: &mut Vec<bam::Record>,
) -> io::Result<()> {
    while batch.len() < PREFETCH_BATCH_RECORDS {
        let mut record = bam::Record::default();
        if reader.read_record(&mut record)? == 0 {
            break;
        }
        batch.push(record);
    }
    Ok(())
}

fn unbatch(batch: io::Result<Vec<bam::Record>>) -> impl Iterator<Item = io::Result<bam::Record>> {
    let (records, error) = match batch {
        Ok(records) => (records, None),
        Err(e) => (Vec::new(), Some(e)),
    };
    records
        .into_iter()
        .map(Ok::<_, io::Error>)
        .chain(error.map(Err))
}

fn write_pileup<S, F, W>(
    mut pileup: Pileup<S, F>,
    output: &Output<'_>,
    writer: &mut W,
) -> Result<PileupStats>
where
    S: RecordSource,
    F: ReadFilter,
    W: Write,
{
    writeln!(writer, "{TSV_HEADER}")?;

    let mut current_reference: Option<usize> = None;
    while let Some(column) = pileup.next_column()? {
        let chrom = column
            .reference_sequence_id()
            .and_then(|id| output.names.get(id))
            .map_or("*", String::as_str);
        if column.reference_sequence_id() != current_reference {
            current_reference = column.reference_sequence_id();
            tracing::info!(reference = chrom, "piling up reference");
        }

        let ref_base = output
            .fasta
            .and_then(|fasta| fasta.base_at(chrom, column.position()))
            .unwrap_or(b'N');
        let counts = column.base_counts(output.min_baseq);
        // make output 1-based
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            chrom,
            column.position() + 1,
            ref_base as char,
            counts.depth,
            counts.a,
            counts.c,
            counts.g,
            counts.t,
            counts.n,
            counts.del,
            counts.ins,
            counts.ref_skip,
        )?;
    }
    writer.flush()?;

    Ok(pileup.stats().clone())
}
