//! Fuzz target for FASTA line classification.

#![no_main]

use kmerbatch::fasta::{sample_id, Line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match Line::parse(data) {
        Line::Header(id) => {
            assert_eq!(data[0], b'>');
            assert!(!id.iter().any(u8::is_ascii_whitespace));
            let sample = sample_id(id);
            assert!(id.starts_with(sample));
            assert!(!sample.contains(&b'_'));
        }
        Line::Body(seq) => {
            assert!(data.starts_with(seq));
            assert!(!seq.last().is_some_and(u8::is_ascii_whitespace));
        }
    }
});
