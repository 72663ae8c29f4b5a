//! Batched alignment of a query FASTA against many reference databases.
//!
//! The query is streamed into chunk files of at most `chunk_size` records.
//! Each chunk is searched against every reference database; the (chunk,
//! reference) invocations of a chunk are drained by a pool of `jobs` workers,
//! and their hit tables are appended to the merged output in reference order.
//!
//! Any failed invocation aborts the run. No further invocations are started,
//! the work directory with its chunk and hit files is removed, and the merged
//! output is never moved into place. The merged table only appears at its
//! destination once every search succeeded.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmerbatch::config::SearchConfig;
//! use kmerbatch::orchestrator::run;
//!
//! let config = SearchConfig {
//!     query: Some("reads.fasta".into()),
//!     reference: Some("refdbs/".into()),
//!     chunk_size: 10_000,
//!     ..SearchConfig::default()
//! };
//! let summary = run(&config, |progress| eprintln!("{progress}"))?;
//! println!("{} hits written to {}", summary.hits, summary.output.display());
//! # Ok::<(), kmerbatch::error::KmerBatchError>(())
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use rayon::prelude::*;
use serde::Serialize;
use tempfile::NamedTempFile;

#[cfg(feature = "tracing")]
use tracing::{debug, debug_span, error, info, info_span, warn};

use crate::{
    aligner::{CommandOutput, CommandRunner, Invocation, SystemRunner},
    chunk::{Chunk, ChunkSplitter},
    config::SearchConfig,
    error::KmerBatchError,
    fasta::count_sequences,
    progress::{SearchClock, SearchProgress},
    refdb::ReferenceSource,
};

/// Base delay between retries; attempt `n` waits `n` times this long.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Totals for a finished search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub sequences: u64,
    pub chunks: usize,
    pub references: usize,
    pub searches: u64,
    /// Hit-table rows in the merged output.
    pub hits: u64,
    pub elapsed_secs: f64,
    pub output: PathBuf,
}

enum Outcome {
    Done(CommandOutput),
    Failed(CommandOutput),
    SpawnFailed(io::Error),
    Skipped,
}

impl Outcome {
    const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::SpawnFailed(_))
    }
}

/// Drives one search run with a given [`CommandRunner`].
pub struct Orchestrator<'r> {
    config: SearchConfig,
    runner: &'r dyn CommandRunner,
}

impl<'r> Orchestrator<'r> {
    pub fn new(config: SearchConfig, runner: &'r dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// Runs every (chunk, reference) search and merges the hit tables.
    ///
    /// `on_progress` is called on the calling thread after each search is
    /// merged.
    pub fn run<F>(&self, mut on_progress: F) -> Result<SearchSummary, KmerBatchError>
    where
        F: FnMut(&SearchProgress),
    {
        let config = &self.config;
        config.validate()?;

        let (Some(query), Some(reference), Some(output)) = (
            config.query.as_deref(),
            config.reference.as_deref(),
            config.output_path(),
        ) else {
            return Err(KmerBatchError::MissingParameters {
                names: vec!["output"],
            });
        };

        let refs = ReferenceSource::parse(reference).resolve(&config.ref_extension)?;

        let total_sequences = count_sequences(open_query(query)?)
            .map_err(KmerBatchError::input(query))?;
        if total_sequences == 0 {
            return Err(KmerBatchError::EmptyQuery {
                path: query.to_path_buf(),
            });
        }
        let chunk_size = config.chunk_size as u64;
        let total_chunks = total_sequences.div_ceil(chunk_size);
        let total_searches = total_chunks * refs.len() as u64;

        #[cfg(feature = "tracing")]
        info!(
            query = %query.display(),
            references = refs.len(),
            sequences = total_sequences,
            chunks = total_chunks,
            searches = total_searches,
            jobs = config.jobs,
            "Starting batch search"
        );

        let parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let workdir = tempfile::Builder::new()
            .prefix(".kmerbatch_work_")
            .tempdir_in(parent)?;
        let mut merged = merged_tempfile(parent)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()?;

        let mut clock = SearchClock::new(total_searches, total_sequences);
        let mut splitter = ChunkSplitter::new(
            open_query(query)?,
            query,
            workdir.path(),
            config.chunk_size,
        );
        let mut sequences_processed = 0;
        let mut chunks = 0;
        let mut hits = 0;

        {
            let mut writer = BufWriter::new(merged.as_file_mut());

            while let Some(chunk) = splitter.next_chunk()? {
                #[cfg(feature = "tracing")]
                let _span = info_span!("chunk", index = chunk.index, sequences = chunk.sequences)
                    .entered();

                let invocations: Vec<Invocation> = refs
                    .iter()
                    .enumerate()
                    .map(|(i, reference)| {
                        let result = workdir
                            .path()
                            .join(format!("chunk_{:05}_ref_{i:03}.b6", chunk.index));
                        Invocation::usearch_global(
                            &config.aligner,
                            chunk.index,
                            &chunk.path,
                            reference,
                            &result,
                        )
                    })
                    .collect();

                let mut outcomes = self.dispatch(&pool, &invocations);
                if let Some(first) = outcomes.iter().position(Outcome::is_failure) {
                    check(&invocations[first], outcomes.swap_remove(first))?;
                }
                sequences_processed += chunk.sequences;

                for (invocation, outcome) in invocations.iter().zip(outcomes) {
                    check(invocation, outcome)?;
                    hits += append_hits(&invocation.result_path, &mut writer)?;
                    clock.complete_search();
                    on_progress(&clock.snapshot(sequences_processed));
                }

                remove_chunk(&chunk)?;
                chunks += 1;
            }

            writer.flush()?;
        }

        if hits == 0 {
            return Err(KmerBatchError::EmptyMerge {
                searches: total_searches,
            });
        }

        merged.persist(&output).map_err(|e| e.error)?;
        workdir.close()?;

        let elapsed = clock.snapshot(sequences_processed).elapsed;

        #[cfg(feature = "tracing")]
        info!(
            output = %output.display(),
            hits,
            elapsed_secs = elapsed.as_secs_f64(),
            "Batch search complete"
        );

        Ok(SearchSummary {
            sequences: sequences_processed,
            chunks,
            references: refs.len(),
            searches: total_searches,
            hits,
            elapsed_secs: elapsed.as_secs_f64(),
            output,
        })
    }

    /// Runs a chunk's invocations on the pool, preserving reference order.
    ///
    /// Once one invocation fails, workers skip the ones not yet started.
    fn dispatch(&self, pool: &rayon::ThreadPool, invocations: &[Invocation]) -> Vec<Outcome> {
        let abort = AtomicBool::new(false);
        let retries = self.config.retries;

        pool.install(|| {
            invocations
                .par_iter()
                .map(|invocation| {
                    if abort.load(Ordering::Acquire) {
                        return Outcome::Skipped;
                    }
                    let outcome = run_with_retries(self.runner, invocation, retries);
                    if !matches!(outcome, Outcome::Done(_)) {
                        abort.store(true, Ordering::Release);
                    }
                    outcome
                })
                .collect()
        })
    }
}

/// Runs a search with the system aligner.
pub fn run<F>(config: &SearchConfig, on_progress: F) -> Result<SearchSummary, KmerBatchError>
where
    F: FnMut(&SearchProgress),
{
    Orchestrator::new(config.clone(), &SystemRunner).run(on_progress)
}

/// Temporary merged table beside the output.
///
/// Created with mode `0o666` less the umask, like a plain `File::create`, so
/// the persisted table is not owner-only.
fn merged_tempfile(parent: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".kmerbatch_merged_");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(parent)
}

fn open_query(query: &Path) -> Result<BufReader<File>, KmerBatchError> {
    File::open(query)
        .map(BufReader::new)
        .map_err(KmerBatchError::input(query))
}

fn run_with_retries(runner: &dyn CommandRunner, invocation: &Invocation, retries: u32) -> Outcome {
    #[cfg(feature = "tracing")]
    let _span = debug_span!(
        "invocation",
        chunk = invocation.chunk,
        reference = %invocation.reference.display()
    )
    .entered();

    let mut attempt = 0;
    loop {
        #[cfg(feature = "tracing")]
        debug!(attempt, command = %invocation.command_line(), "Running aligner");

        match runner.run(invocation) {
            Err(source) => return Outcome::SpawnFailed(source),
            Ok(output) if output.success() => return Outcome::Done(output),
            Ok(output) if attempt >= retries => return Outcome::Failed(output),
            Ok(_output) => {
                attempt += 1;

                #[cfg(feature = "tracing")]
                warn!(
                    attempt,
                    code = %_output.code_display(),
                    reference = %invocation.reference.display(),
                    "Aligner failed, retrying"
                );

                thread::sleep(RETRY_BACKOFF * attempt);
            }
        }
    }
}

fn check(invocation: &Invocation, outcome: Outcome) -> Result<(), KmerBatchError> {
    match outcome {
        Outcome::Done(_output) => {
            #[cfg(feature = "tracing")]
            debug!(stdout = %_output.stdout.trim_end(), "Aligner finished");
            Ok(())
        }
        Outcome::Failed(output) => {
            #[cfg(feature = "tracing")]
            error!(
                chunk = invocation.chunk,
                reference = %invocation.reference.display(),
                code = %output.code_display(),
                "Aligner failed"
            );
            Err(KmerBatchError::AlignerFailed {
                program: invocation.program.clone(),
                reference: invocation.reference.clone(),
                chunk: invocation.chunk,
                code: output.code_display(),
                stderr: output.stderr,
            })
        }
        Outcome::SpawnFailed(source) => Err(KmerBatchError::AlignerSpawn {
            source,
            program: invocation.program.clone(),
        }),
        // Workers only skip once some invocation of the chunk has failed, and
        // the caller reports that failure before any skipped one.
        Outcome::Skipped => Err(KmerBatchError::AlignerFailed {
            program: invocation.program.clone(),
            reference: invocation.reference.clone(),
            chunk: invocation.chunk,
            code: "not run".to_string(),
            stderr: String::new(),
        }),
    }
}

/// Appends one hit table to the merged output, then deletes it.
///
/// A missing hit table counts as zero hits.
fn append_hits<W: Write>(path: &Path, out: &mut W) -> Result<u64, KmerBatchError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            #[cfg(feature = "tracing")]
            warn!(path = %path.display(), "Aligner wrote no hit table");
            return Ok(0);
        }
        Err(e) => return Err(KmerBatchError::input(path)(e)),
    };

    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut rows = 0;
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| KmerBatchError::InputRead {
                source,
                path: path.to_path_buf(),
            })?;
        if read == 0 {
            break;
        }
        out.write_all(&line)?;
        if !line.ends_with(b"\n") {
            out.write_all(b"\n")?;
        }
        rows += 1;
    }

    std::fs::remove_file(path)?;
    Ok(rows)
}

fn remove_chunk(chunk: &Chunk) -> Result<(), KmerBatchError> {
    std::fs::remove_file(&chunk.path)?;
    Ok(())
}
