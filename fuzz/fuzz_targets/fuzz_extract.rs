//! Fuzz target for the k-mer extractor.
//!
//! Arbitrary bytes are fed through every output mode. Checks that:
//! 1. No input makes the extractor fail or panic
//! 2. Table counts sum to the number of windows scanned
//! 3. Text mode emits exactly the distinct k-mers

#![no_main]

use kmerbatch::cli::OutputMode;
use kmerbatch::extract::extract_kmers;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&k, fasta)) = data.split_first() else {
        return;
    };
    let k = usize::from(k % 16) + 1;

    for mode in [OutputMode::Count, OutputMode::Fasta, OutputMode::SampleTable] {
        extract_kmers(fasta, k, mode, &mut std::io::sink(), |_| {}).unwrap();
    }

    let mut table = Vec::new();
    let summary = extract_kmers(fasta, k, OutputMode::Table, &mut table, |_| {}).unwrap();
    let total: u64 = table
        .split(|&b| b == b'\n')
        .filter(|row| !row.is_empty())
        .map(|row| {
            let tab = row.iter().rposition(|&b| b == b'\t').unwrap();
            std::str::from_utf8(&row[tab + 1..]).unwrap().parse::<u64>().unwrap()
        })
        .sum();
    assert_eq!(total, summary.kmers_scanned, "table does not sum to scanned windows");

    let mut text = Vec::new();
    let text_summary = extract_kmers(fasta, k, OutputMode::Text, &mut text, |_| {}).unwrap();
    assert_eq!(text_summary.distinct, summary.distinct);
});
