//! Error types for kmerbatch.
//!
//! Every fallible library operation returns [`KmerBatchError`]. Variants carry
//! enough context (paths, reference databases, captured aligner output) that
//! the binary can print them without further decoration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in kmerbatch operations.
#[derive(Debug, Error)]
pub enum KmerBatchError {
    /// K-mer length must be a positive integer.
    #[error("invalid k-mer length {k}: must be at least 1")]
    InvalidKmerLength { k: usize },

    /// One or more required parameters were not supplied.
    #[error("missing required parameter(s): {}", names.join(", "))]
    MissingParameters { names: Vec<&'static str> },

    /// A parameter was supplied with a value that cannot be used.
    #[error("invalid value for {name}: {details}")]
    InvalidParameter { name: &'static str, details: String },

    /// Failed to open or read an input file.
    #[error("failed to read '{path}': {source}")]
    InputRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Reference source resolved to zero databases.
    #[error("no reference databases found in '{source_desc}' (extension filter: .{extension})")]
    NoReferenceDatabases {
        source_desc: String,
        extension: String,
    },

    /// Query file contained no complete sequence records.
    #[error("query file '{path}' contains no sequences")]
    EmptyQuery { path: PathBuf },

    /// The external aligner exited unsuccessfully.
    #[error(
        "{program} failed on chunk {chunk} against reference db '{reference}' (exit code {code}):\n{stderr}\n\
         If the aligner ran out of memory, try a smaller --chunk-size"
    )]
    AlignerFailed {
        program: String,
        reference: PathBuf,
        chunk: usize,
        code: String,
        stderr: String,
    },

    /// The external aligner could not be started.
    #[error("failed to launch aligner '{program}': {source}")]
    AlignerSpawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Every invocation succeeded but the merged output is empty.
    #[error("merged output is empty: {searches} search(es) produced no hits")]
    EmptyMerge { searches: u64 },

    /// The aligner worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Failed to serialize the run summary.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for KmerBatchError {
    fn from(source: std::io::Error) -> Self {
        Self::WriteError { source }
    }
}

impl From<serde_json::Error> for KmerBatchError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonError { source }
    }
}

impl KmerBatchError {
    pub(crate) fn input(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::InputRead { source, path }
    }
}
