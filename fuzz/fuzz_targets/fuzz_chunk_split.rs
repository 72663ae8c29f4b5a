//! Fuzz target for query chunking.
//!
//! Whatever the input, the chunk files must hold exactly the sequences that
//! a full count finds, and no chunk may exceed the chunk size.

#![no_main]

use kmerbatch::chunk::ChunkSplitter;
use kmerbatch::fasta::count_sequences;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Some((&size, query)) = data.split_first() else {
        return;
    };
    let size = usize::from(size % 8) + 1;

    let dir = tempfile::tempdir().unwrap();
    let mut splitter = ChunkSplitter::new(query, Path::new("fuzz.fa"), dir.path(), size);
    let mut total = 0;
    while let Some(chunk) = splitter.next_chunk().unwrap() {
        assert!(chunk.sequences >= 1 && chunk.sequences as usize <= size);
        total += chunk.sequences;
    }

    assert_eq!(total, count_sequences(query).unwrap());
});
