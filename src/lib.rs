//! # kmerbatch
//!
//! Two FASTA pipeline stages that do their work in a bounded amount of memory:
//!
//! - [`extract`]: a streaming k-mer extractor. It reads a FASTA one physical
//!   line at a time and produces the distinct k-mer count, first-sighting
//!   k-mers as FASTA or plain text, a global `kmer<TAB>count` table, or a
//!   k-mer by sample matrix for QIIME-style `SAMPLE_seqnum` identifiers.
//! - [`orchestrator`]: a batch alignment driver. It splits a large query
//!   FASTA into chunks of whole records and runs an external aligner
//!   (`usearch -usearch_global`) on every (chunk, reference database) pair
//!   with a bounded worker pool. It stops at the first failure and merges the
//!   hit tables into one file.
//!
//! ## Quick start
//!
//! ```rust
//! use kmerbatch::cli::OutputMode;
//! use kmerbatch::extract::extract_kmers;
//!
//! let fasta = b">s1\nACGTACGT\n>s2\nACGT\n";
//! let mut table = Vec::new();
//! extract_kmers(&fasta[..], 4, OutputMode::Table, &mut table, |_| {})?;
//!
//! assert_eq!(table, b"ACGT\t3\nCGTA\t1\nGTAC\t1\nTACG\t1\n");
//! # Ok::<(), kmerbatch::error::KmerBatchError>(())
//! ```
//!
//! ## Input contract
//!
//! The extractor does not join wrapped sequence lines. Every body line is a
//! sequence of its own for k-mer purposes, so linearize wrapped FASTA first.
//!
//! ## Features
//!
//! - `tracing`: structured logging via `tracing` (enabled by default)
//! - `gzip`: read `.gz` compressed input in the extractor

pub mod accumulator;
pub mod aligner;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fasta;
pub mod input;
pub mod orchestrator;
pub mod progress;
pub mod refdb;
