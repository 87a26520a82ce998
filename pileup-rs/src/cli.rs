use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pileup-rs",
    about = "Per-base pileup counts from a coordinate-sorted BAM",
    version
)]
pub struct Args {
    /// Input BAM, sorted by coordinate
    pub in_bam: PathBuf,

    /// Output TSV path (stdout if omitted)
    #[arg(short = 'o', long = "out", value_name = "TSV")]
    pub out: Option<PathBuf>,

    /// Genome sequence FASTA, used to fill the reference base column
    #[arg(short = 'S', long = "genome", value_name = "FASTA")]
    pub genome_fasta: Option<PathBuf>,

    /// Skip reads with a mapping quality below this value
    #[arg(short = 'Q', long = "min-mapq", default_value_t = 0)]
    pub min_mapq: u8,

    /// Count bases with a quality below this value as N
    #[arg(short = 'b', long = "min-baseq")]
    pub min_baseq: Option<u8>,

    /// Skip reads with any of these SAM flags set
    #[arg(long, default_value_t = 0x704, value_parser = parse_flags)]
    pub exclude_flags: u16,

    /// Drop malformed or out-of-order records instead of failing
    #[arg(long)]
    pub skip_invalid: bool,

    /// Only report positions covered by at least one read
    #[arg(long)]
    pub no_gaps: bool,

    /// Number of threads (CPUs) to use; >1 decodes BAM on a separate thread
    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    pub threads: u8,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

// Accepts decimal or 0x-prefixed hex, like samtools.
fn parse_flags(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid flag mask '{s}': {e}"))
}
