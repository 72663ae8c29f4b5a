//! Command-line interface definition.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// K-mer tabulation and batched aligner orchestration for FASTA files.
#[derive(Parser, Debug)]
#[command(name = "kmerbatch")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract k-mers from a FASTA file (one physical line per sequence)
    Kmers(KmersArgs),
    /// Align a query FASTA against reference databases in chunks
    Search(SearchArgs),
}

#[derive(ClapArgs, Debug)]
pub struct KmersArgs {
    /// Input FASTA ("-" for stdin)
    #[arg(short, long = "input_fasta", visible_alias = "input")]
    pub input: Option<PathBuf>,

    /// Length of k-mers
    #[arg(short, long = "kmer_size", visible_alias = "kmer-size", value_parser = parse_k)]
    pub k: Option<usize>,

    /// Output type
    #[arg(short = 't', long = "output_type", value_enum, default_value = "fasta")]
    pub output_type: OutputMode,

    /// Output file (required unless --output_type is count)
    #[arg(short, long = "output_file", visible_alias = "output")]
    pub output: Option<PathBuf>,

    /// Print the record count every 100,000 records
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SearchArgs {
    /// Query FASTA
    #[arg(short, long)]
    pub query: Option<PathBuf>,

    /// Directory of reference databases, or comma-separated list of database files
    #[arg(short, long = "ref")]
    pub reference: Option<String>,

    /// Aligner executable
    #[arg(short = 'u', long, default_value = "usearch")]
    pub aligner: String,

    /// Merged hit table (default: <query stem>_hits.b6 next to the query)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Query sequences per chunk
    #[arg(short, long, default_value = "20000")]
    pub chunk_size: usize,

    /// Concurrent aligner invocations
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Threads for each aligner process
    #[arg(short, long, default_value = "1")]
    pub nthreads: usize,

    /// Hits to find for each query sequence
    #[arg(short = 'A', long, default_value = "2")]
    pub max_accepts: u32,

    /// Rejects before giving up on a query sequence
    #[arg(short = 'R', long, default_value = "32")]
    pub max_rejects: u32,

    /// Identity threshold as a fraction
    #[arg(short = 'I', long = "pct_id", default_value = "0.97")]
    pub pct_id: f64,

    /// Fraction of query sequence to align
    #[arg(short = 'Q', long, default_value = "1.0")]
    pub query_coverage: f64,

    /// Fraction of reference sequence to align
    #[arg(short = 'T', long, default_value = "0.0")]
    pub target_coverage: f64,

    /// Search the plus strand only
    #[arg(long)]
    pub no_revcomp: bool,

    /// Extension of database files when --ref is a directory
    #[arg(long, default_value = "udb")]
    pub ref_ext: String,

    /// Re-run a failed invocation this many times before aborting
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    pub json: bool,

    /// Report progress and time remaining after each search
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the k-mer extractor writes.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Number of distinct k-mers
    Count,
    /// First sighting of each k-mer as a FASTA record
    #[default]
    Fasta,
    /// First sighting of each k-mer, one per line
    Text,
    /// Sorted `kmer<TAB>count` rows
    Table,
    /// Sorted k-mer by sample count matrix
    #[value(name = "sample_table", alias = "sample-table")]
    SampleTable,
}

impl OutputMode {
    /// Modes that write k-mers while scanning rather than at the end.
    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::Fasta | Self::Text)
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Count => "count",
            Self::Fasta => "fasta",
            Self::Text => "text",
            Self::Table => "table",
            Self::SampleTable => "sample_table",
        };
        f.write_str(name)
    }
}

fn parse_k(s: &str) -> Result<usize, String> {
    let k: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if k == 0 {
        return Err("k-mer length must be at least 1".to_string());
    }
    Ok(k)
}
