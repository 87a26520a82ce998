mod cli;
mod fasta;
mod header;
mod pipeline;
mod types;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use std::io;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber; stdout carries the table
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let fasta = if let Some(path) = &args.genome_fasta {
        Some(fasta::FastaDb::load(path)?)
    } else {
        None
    };
    let stats = match pipeline::run(&args, fasta.as_ref()) {
        Ok(stats) => stats,
        Err(e) if is_broken_pipe(&e) => return Ok(()),
        Err(e) => return Err(e),
    };
    tracing::info!(
        records = stats.records,
        admitted = stats.admitted,
        filtered = stats.filtered,
        unplaced = stats.unplaced,
        zero_span = stats.zero_span,
        skipped = stats.skipped,
        columns = stats.columns,
        "pileup-rs: processing complete"
    );
    Ok(())
}

/// Returns `true` if the error originated from a broken pipe.
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.root_cause()
        .downcast_ref::<io::Error>()
        .is_some_and(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
}
