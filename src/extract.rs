//! Streaming k-mer extraction.
//!
//! Input is consumed one physical line at a time and only the accumulator
//! grows with the data: memory is proportional to the number of distinct
//! k-mers (times samples, in sample-table mode), never to the input size.
//!
//! Wrapped sequences are *not* reassembled. Each body line is scanned on its
//! own, so a sequence split over several lines yields the k-mers of several
//! shorter sequences. Linearize the input first when that matters.
//!
//! # Example
//!
//! ```rust
//! use kmerbatch::cli::OutputMode;
//! use kmerbatch::extract::extract_kmers;
//!
//! let fasta = b">s1\nACGTACGT\n>s2\nACGT\n";
//! let mut out = Vec::new();
//! let summary = extract_kmers(&fasta[..], 4, OutputMode::Count, &mut out, |_| {})?;
//!
//! assert_eq!(summary.distinct, 4);
//! assert_eq!(out, b"4\n");
//! # Ok::<(), kmerbatch::error::KmerBatchError>(())
//! ```

use std::{
    fs::File,
    io::{self, stdout, BufRead, BufWriter, Write},
    path::Path,
};

use bytes::Bytes;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::{debug, info, info_span};

use crate::{
    accumulator::KmerAccumulator,
    cli::OutputMode,
    config::{KmerConfig, PROGRESS_INTERVAL},
    error::KmerBatchError,
    fasta::{sample_id, Line},
    progress::ExtractProgress,
};

/// Totals for a finished extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    /// Header records seen.
    pub records: u64,
    /// K-mer positions scanned (`max(0, L - k + 1)` summed over body lines).
    pub kmers_scanned: u64,
    /// Distinct k-mers seen.
    pub distinct: usize,
}

/// Line-at-a-time k-mer extractor.
///
/// Holds only the current record's identifiers and the accumulator. A body
/// line before any header is attributed to the empty identifier.
#[derive(Debug)]
pub struct KmerExtractor {
    k: usize,
    mode: OutputMode,
    accumulator: KmerAccumulator,
    seq_id: Bytes,
    sample: Bytes,
    progress: ExtractProgress,
}

impl KmerExtractor {
    pub fn new(k: usize, mode: OutputMode) -> Result<Self, KmerBatchError> {
        if k == 0 {
            return Err(KmerBatchError::InvalidKmerLength { k });
        }
        Ok(Self {
            k,
            mode,
            accumulator: KmerAccumulator::for_mode(mode),
            seq_id: Bytes::new(),
            sample: Bytes::new(),
            progress: ExtractProgress::default(),
        })
    }

    /// Processes one raw input line, streaming any first-sighting output.
    ///
    /// Returns `true` if the line was a header.
    pub fn process_line<W: Write>(&mut self, raw: &[u8], out: &mut W) -> io::Result<bool> {
        match Line::parse(raw) {
            Line::Header(id) => {
                self.progress.records += 1;
                self.seq_id = Bytes::copy_from_slice(id);
                if self.mode == OutputMode::SampleTable {
                    self.sample = self.seq_id.slice_ref(sample_id(&self.seq_id));
                }
                Ok(true)
            }
            Line::Body(seq) => {
                self.scan(seq, out)?;
                Ok(false)
            }
        }
    }

    fn scan<W: Write>(&mut self, seq: &[u8], out: &mut W) -> io::Result<()> {
        if seq.len() < self.k {
            return Ok(());
        }

        for (offset, kmer) in seq.windows(self.k).enumerate() {
            self.progress.kmers_scanned += 1;
            let first = self.accumulator.add(kmer, &self.sample);

            if first && self.mode.is_streaming() {
                if self.mode == OutputMode::Fasta {
                    out.write_all(b">")?;
                    out.write_all(&self.seq_id)?;
                    writeln!(out, "_{offset:09}")?;
                }
                out.write_all(kmer)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    pub const fn progress(&self) -> &ExtractProgress {
        &self.progress
    }

    pub const fn accumulator(&self) -> &KmerAccumulator {
        &self.accumulator
    }

    /// Writes the mode's final output and returns the run totals.
    pub fn finish<W: Write>(self, out: &mut W) -> io::Result<(ExtractSummary, KmerAccumulator)> {
        match self.mode {
            OutputMode::Count => writeln!(out, "{}", self.accumulator.distinct())?,
            OutputMode::Table => self.accumulator.write_table(out)?,
            OutputMode::SampleTable => self.accumulator.write_sample_table(out)?,
            OutputMode::Fasta | OutputMode::Text => {}
        }
        out.flush()?;

        let summary = ExtractSummary {
            records: self.progress.records,
            kmers_scanned: self.progress.kmers_scanned,
            distinct: self.accumulator.distinct(),
        };
        Ok((summary, self.accumulator))
    }
}

/// Extracts k-mers from an in-memory or already opened FASTA stream.
///
/// `on_progress` is called every 100,000 header records.
pub fn extract_kmers<R, W, F>(
    reader: R,
    k: usize,
    mode: OutputMode,
    out: &mut W,
    on_progress: F,
) -> Result<ExtractSummary, KmerBatchError>
where
    R: BufRead,
    W: Write,
    F: FnMut(&ExtractProgress),
{
    let extractor = KmerExtractor::new(k, mode)?;
    drive(reader, Path::new("<input>"), extractor, out, on_progress)
}

/// Runs a configured extraction: opens the input, then the output, then streams.
pub fn run<F>(config: &KmerConfig, on_progress: F) -> Result<ExtractSummary, KmerBatchError>
where
    F: FnMut(&ExtractProgress),
{
    #[cfg(feature = "tracing")]
    let _span = info_span!("extract", input = %config.input, k = config.k, mode = %config.mode)
        .entered();

    let extractor = KmerExtractor::new(config.k, config.mode)?;
    let reader = config.input.open()?;
    let mut out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(stdout())),
    };

    let summary = drive(reader, config.input.label(), extractor, &mut out, on_progress)?;

    #[cfg(feature = "tracing")]
    info!(
        records = summary.records,
        kmers_scanned = summary.kmers_scanned,
        distinct = summary.distinct,
        "K-mer extraction complete"
    );

    Ok(summary)
}

fn drive<R, W, F>(
    mut reader: R,
    label: &Path,
    mut extractor: KmerExtractor,
    out: &mut W,
    mut on_progress: F,
) -> Result<ExtractSummary, KmerBatchError>
where
    R: BufRead,
    W: Write,
    F: FnMut(&ExtractProgress),
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| KmerBatchError::InputRead {
                source,
                path: label.to_path_buf(),
            })?;
        if read == 0 {
            break;
        }

        let is_header = extractor.process_line(&line, out)?;
        if is_header && extractor.progress().records % PROGRESS_INTERVAL == 0 {
            on_progress(extractor.progress());
        }
    }

    #[cfg(feature = "tracing")]
    debug!(
        records = extractor.progress().records,
        "Input exhausted, writing output"
    );

    let (summary, _) = extractor.finish(out)?;
    Ok(summary)
}
