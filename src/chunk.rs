//! Query chunk splitting.
//!
//! A chunk is closed on the header that follows its `chunk_size`-th completed
//! record (or at end of input), so a record is never divided between two
//! chunk files, even when its sequence is wrapped over several lines.

use std::{
    fs::File,
    io::{BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    error::KmerBatchError,
    fasta::{Line, TerminatorTracker},
};

/// One chunk file written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the query.
    pub index: usize,
    pub path: PathBuf,
    /// Completed records in this chunk.
    pub sequences: u64,
}

/// Streams a query FASTA into bounded chunk files under `dir`.
pub struct ChunkSplitter<R> {
    reader: R,
    query: PathBuf,
    dir: PathBuf,
    chunk_size: u64,
    tracker: TerminatorTracker,
    carry: Option<Vec<u8>>,
    next_index: usize,
    exhausted: bool,
}

impl<R: BufRead> ChunkSplitter<R> {
    /// `query` is only used to label read errors.
    pub fn new(reader: R, query: &Path, dir: &Path, chunk_size: usize) -> Self {
        Self {
            reader,
            query: query.to_path_buf(),
            dir: dir.to_path_buf(),
            chunk_size: chunk_size.max(1) as u64,
            tracker: TerminatorTracker::new(),
            carry: None,
            next_index: 0,
            exhausted: false,
        }
    }

    /// Writes the next chunk; `None` once the query holds no more records.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, KmerBatchError> {
        if self.exhausted {
            return Ok(None);
        }

        let index = self.next_index;
        let path = self.dir.join(format!("chunk_{index:05}.fasta"));
        let mut out = BufWriter::new(File::create(&path)?);
        let mut sequences = 0;

        if let Some(header) = self.carry.take() {
            out.write_all(&header)?;
        }

        let mut line = Vec::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .map_err(|source| KmerBatchError::InputRead {
                    source,
                    path: self.query.clone(),
                })?;
            if read == 0 {
                if self.tracker.finish() {
                    sequences += 1;
                }
                self.exhausted = true;
                break;
            }

            if self.tracker.push(&Line::parse(&line)) {
                sequences += 1;
                if sequences == self.chunk_size {
                    self.carry = Some(std::mem::take(&mut line));
                    break;
                }
            }
            out.write_all(&line)?;
        }

        out.flush()?;
        drop(out);

        if sequences == 0 {
            std::fs::remove_file(&path)?;
            return Ok(None);
        }

        self.next_index += 1;
        Ok(Some(Chunk {
            index,
            path,
            sequences,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn split(fasta: &str, size: usize) -> Vec<(Chunk, String)> {
        let dir = tempfile::tempdir().unwrap();
        let mut splitter =
            ChunkSplitter::new(fasta.as_bytes(), Path::new("q.fa"), dir.path(), size);
        let mut chunks = Vec::new();
        while let Some(chunk) = splitter.next_chunk().unwrap() {
            let text = fs::read_to_string(&chunk.path).unwrap();
            chunks.push((chunk, text));
        }
        chunks
    }

    #[test]
    fn splits_linear_records() {
        let chunks = split(">a\nAA\n>b\nCC\n>c\nGG\n", 2);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].1, ">a\nAA\n>b\nCC\n");
        assert_eq!(chunks[0].0.sequences, 2);
        assert_eq!(chunks[1].1, ">c\nGG\n");
        assert_eq!(chunks[1].0.index, 1);
    }

    #[test]
    fn wrapped_records_stay_whole() {
        let chunks = split(">a\nAA\nTT\n>b\nCC\nGG\n", 1);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].1, ">a\nAA\nTT\n");
        assert_eq!(chunks[1].1, ">b\nCC\nGG\n");
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let chunks = split(">a\nA\n>b\nC\n", 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0.sequences, 2);
    }

    #[test]
    fn empty_query_yields_no_chunks() {
        assert!(split("", 3).is_empty());
    }

    #[test]
    fn chunk_files_are_removed_with_their_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut splitter =
                ChunkSplitter::new(&b">a\nA\n"[..], Path::new("q.fa"), dir.path(), 1);
            splitter.next_chunk().unwrap().unwrap().path
        };
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }
}
