//! Validated run configuration.
//!
//! Both configs are checked before any file is opened, and every missing
//! required value is reported at once.

use std::path::{Path, PathBuf};

use crate::{
    cli::{KmersArgs, OutputMode, SearchArgs},
    error::KmerBatchError,
    input::Input,
};

/// Progress is reported every this many header records.
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Configuration for one k-mer extraction run.
#[derive(Debug, Clone)]
pub struct KmerConfig {
    pub input: Input,
    pub k: usize,
    pub mode: OutputMode,
    /// `None` writes the count to stdout; only valid in [`OutputMode::Count`].
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl KmerConfig {
    pub fn new(
        input: Option<&Path>,
        k: Option<usize>,
        mode: OutputMode,
        output: Option<PathBuf>,
    ) -> Result<Self, KmerBatchError> {
        let mut missing = Vec::new();
        if input.is_none() {
            missing.push("input_fasta");
        }
        if k.is_none() {
            missing.push("kmer_size");
        }
        if output.is_none() && mode != OutputMode::Count {
            missing.push("output_file");
        }

        match (input, k) {
            (Some(input), Some(k)) if missing.is_empty() => {
                if k == 0 {
                    return Err(KmerBatchError::InvalidKmerLength { k });
                }
                Ok(Self {
                    input: Input::from(input),
                    k,
                    mode,
                    output,
                    verbose: false,
                })
            }
            _ => Err(KmerBatchError::MissingParameters { names: missing }),
        }
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl TryFrom<KmersArgs> for KmerConfig {
    type Error = KmerBatchError;

    fn try_from(args: KmersArgs) -> Result<Self, Self::Error> {
        Ok(Self::new(args.input.as_deref(), args.k, args.output_type, args.output)?
            .verbose(args.verbose))
    }
}

/// Strand(s) the aligner searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Both,
    Plus,
}

impl Strand {
    pub const fn from_revcomp(reverse_complement: bool) -> Self {
        if reverse_complement {
            Self::Both
        } else {
            Self::Plus
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Plus => "plus",
        }
    }
}

/// Parameters forwarded verbatim to every aligner invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignerParams {
    pub program: String,
    pub pct_id: f64,
    pub query_coverage: f64,
    pub target_coverage: f64,
    pub max_accepts: u32,
    pub max_rejects: u32,
    pub threads: usize,
    pub strand: Strand,
}

impl Default for AlignerParams {
    fn default() -> Self {
        Self {
            program: "usearch".to_string(),
            pct_id: 0.97,
            query_coverage: 1.0,
            target_coverage: 0.0,
            max_accepts: 2,
            max_rejects: 32,
            threads: 1,
            strand: Strand::Both,
        }
    }
}

/// Configuration for one batch alignment run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub query: Option<PathBuf>,
    /// Directory of databases or a comma-separated list of database files.
    pub reference: Option<String>,
    pub output: Option<PathBuf>,
    pub chunk_size: usize,
    /// Upper bound on aligner processes running at once.
    pub jobs: usize,
    pub ref_extension: String,
    pub retries: u32,
    pub aligner: AlignerParams,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: None,
            reference: None,
            output: None,
            chunk_size: 20_000,
            jobs: 1,
            ref_extension: "udb".to_string(),
            retries: 0,
            aligner: AlignerParams::default(),
        }
    }
}

impl SearchConfig {
    /// Checks required values and numeric ranges without touching the filesystem.
    pub fn validate(&self) -> Result<(), KmerBatchError> {
        let mut missing = Vec::new();
        if self.query.is_none() {
            missing.push("query");
        }
        if self.reference.as_deref().map_or(true, |r| r.trim().is_empty()) {
            missing.push("ref");
        }
        if !missing.is_empty() {
            return Err(KmerBatchError::MissingParameters { names: missing });
        }

        if self.chunk_size == 0 {
            return Err(KmerBatchError::InvalidParameter {
                name: "chunk_size",
                details: "must be at least 1".to_string(),
            });
        }
        if self.jobs == 0 {
            return Err(KmerBatchError::InvalidParameter {
                name: "jobs",
                details: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Destination of the merged hit table.
    ///
    /// Defaults to `<query stem>_hits.b6` beside the query.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        let query = self.query.as_ref()?;
        let stem = query.file_stem()?.to_string_lossy();
        Some(query.with_file_name(format!("{stem}_hits.b6")))
    }
}

impl From<SearchArgs> for SearchConfig {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            reference: args.reference,
            output: args.output,
            chunk_size: args.chunk_size,
            jobs: args.jobs,
            ref_extension: args.ref_ext,
            retries: args.retries,
            aligner: AlignerParams {
                program: args.aligner,
                pct_id: args.pct_id,
                query_coverage: args.query_coverage,
                target_coverage: args.target_coverage,
                max_accepts: args.max_accepts,
                max_rejects: args.max_rejects,
                threads: args.nthreads,
                strand: Strand::from_revcomp(!args.no_revcomp),
            },
        }
    }
}
