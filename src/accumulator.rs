//! Mode-specific k-mer accumulators.
//!
//! The variant is chosen once per run from the output mode, so a run never
//! carries the maps of a mode it isn't producing. K-mers are stored as
//! [`Bytes`]; the per-sample table shares each key with the global seen-set
//! by reference count rather than by copy.

use std::io::Write;

use bytes::Bytes;
use rayon::slice::ParallelSliceMut;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cli::OutputMode;

type Counts = FxHashMap<Bytes, u64>;

/// Accumulated k-mer state for one extraction run.
#[derive(Debug)]
pub enum KmerAccumulator {
    /// Distinct k-mers only (`count`, `fasta`, `text`).
    Set(FxHashSet<Bytes>),
    /// Global occurrence count per k-mer (`table`).
    Table(Counts),
    /// Occurrence count per sample per k-mer (`sample_table`).
    SampleTable {
        seen: FxHashSet<Bytes>,
        samples: FxHashMap<Bytes, Counts>,
    },
}

impl KmerAccumulator {
    pub fn for_mode(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Count | OutputMode::Fasta | OutputMode::Text => {
                Self::Set(FxHashSet::default())
            }
            OutputMode::Table => Self::Table(Counts::default()),
            OutputMode::SampleTable => Self::SampleTable {
                seen: FxHashSet::default(),
                samples: FxHashMap::default(),
            },
        }
    }

    /// Records one occurrence of `kmer` in `sample`.
    ///
    /// Returns `true` the first time this exact k-mer is seen anywhere in the
    /// run. Set mode ignores repeat occurrences; the table modes count them.
    pub fn add(&mut self, kmer: &[u8], sample: &Bytes) -> bool {
        match self {
            Self::Set(seen) => {
                if seen.contains(kmer) {
                    false
                } else {
                    seen.insert(Bytes::copy_from_slice(kmer))
                }
            }
            Self::Table(counts) => {
                if let Some(count) = counts.get_mut(kmer) {
                    *count += 1;
                    false
                } else {
                    counts.insert(Bytes::copy_from_slice(kmer), 1);
                    true
                }
            }
            Self::SampleTable { seen, samples } => {
                let (key, first) = match seen.get(kmer) {
                    Some(key) => (key.clone(), false),
                    None => {
                        let key = Bytes::copy_from_slice(kmer);
                        seen.insert(key.clone());
                        (key, true)
                    }
                };
                *samples
                    .entry(sample.clone())
                    .or_default()
                    .entry(key)
                    .or_insert(0) += 1;
                first
            }
        }
    }

    /// Number of distinct k-mers seen.
    pub fn distinct(&self) -> usize {
        match self {
            Self::Set(seen) | Self::SampleTable { seen, .. } => seen.len(),
            Self::Table(counts) => counts.len(),
        }
    }

    /// Global occurrence count of `kmer`.
    ///
    /// Set mode does not count repeats, so it reports `1` for any seen k-mer.
    pub fn count(&self, kmer: &[u8]) -> u64 {
        match self {
            Self::Set(seen) => u64::from(seen.contains(kmer)),
            Self::Table(counts) => counts.get(kmer).copied().unwrap_or(0),
            Self::SampleTable { samples, .. } => samples
                .values()
                .map(|counts| counts.get(kmer).copied().unwrap_or(0))
                .sum(),
        }
    }

    /// Occurrences of `kmer` within `sample`; always `0` outside sample-table mode.
    pub fn sample_count(&self, sample: &[u8], kmer: &[u8]) -> u64 {
        match self {
            Self::SampleTable { samples, .. } => samples
                .get(sample)
                .and_then(|counts| counts.get(kmer))
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Sample identifiers in sorted order; empty outside sample-table mode.
    pub fn sorted_samples(&self) -> Vec<&Bytes> {
        match self {
            Self::SampleTable { samples, .. } => sorted(samples.keys().collect()),
            _ => Vec::new(),
        }
    }

    /// Distinct k-mers in lexicographic order.
    pub fn sorted_kmers(&self) -> Vec<&Bytes> {
        match self {
            Self::Set(seen) | Self::SampleTable { seen, .. } => sorted(seen.iter().collect()),
            Self::Table(counts) => sorted(counts.keys().collect()),
        }
    }

    /// Writes `kmer<TAB>count` rows sorted by k-mer.
    pub fn write_table<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for kmer in self.sorted_kmers() {
            out.write_all(kmer)?;
            writeln!(out, "\t{}", self.count(kmer))?;
        }
        Ok(())
    }

    /// Writes the `#kmer` header row, then one row per sorted k-mer with a
    /// column per sorted sample.
    pub fn write_sample_table<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let Self::SampleTable { samples, .. } = self else {
            return self.write_table(out);
        };
        let sample_ids = self.sorted_samples();
        let columns: Vec<&Counts> = sample_ids
            .iter()
            .filter_map(|id| samples.get(*id))
            .collect();

        out.write_all(b"#kmer")?;
        for id in &sample_ids {
            out.write_all(b"\t")?;
            out.write_all(id)?;
        }
        out.write_all(b"\n")?;

        for kmer in self.sorted_kmers() {
            out.write_all(kmer)?;
            for counts in &columns {
                write!(out, "\t{}", counts.get(kmer).copied().unwrap_or(0))?;
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn sorted(mut keys: Vec<&Bytes>) -> Vec<&Bytes> {
    keys.par_sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &'static [u8]) -> Bytes {
        Bytes::from_static(id)
    }

    #[test]
    fn set_reports_first_sighting_only() {
        let mut acc = KmerAccumulator::for_mode(OutputMode::Text);
        let s = sample(b"");
        assert!(acc.add(b"ACGT", &s));
        assert!(!acc.add(b"ACGT", &s));
        assert!(acc.add(b"CGTA", &s));
        assert_eq!(acc.distinct(), 2);
        assert_eq!(acc.count(b"ACGT"), 1);
    }

    #[test]
    fn table_counts_every_occurrence() {
        let mut acc = KmerAccumulator::for_mode(OutputMode::Table);
        let s = sample(b"");
        for kmer in [b"AAA", b"CCC", b"AAA", b"AAA"] {
            acc.add(kmer, &s);
        }
        assert_eq!(acc.count(b"AAA"), 3);
        assert_eq!(acc.count(b"CCC"), 1);
        assert_eq!(acc.count(b"GGG"), 0);
        assert_eq!(acc.distinct(), 2);
    }

    #[test]
    fn sample_table_partitions_counts() {
        let mut acc = KmerAccumulator::for_mode(OutputMode::SampleTable);
        let a = sample(b"A");
        let b = sample(b"B");
        acc.add(b"AC", &a);
        acc.add(b"AC", &b);
        acc.add(b"AC", &b);
        acc.add(b"GT", &a);

        assert_eq!(acc.sample_count(b"A", b"AC"), 1);
        assert_eq!(acc.sample_count(b"B", b"AC"), 2);
        assert_eq!(acc.sample_count(b"B", b"GT"), 0);
        assert_eq!(acc.count(b"AC"), 3);
        assert_eq!(acc.distinct(), 2);
    }

    #[test]
    fn table_output_is_sorted() {
        let mut acc = KmerAccumulator::for_mode(OutputMode::Table);
        let s = sample(b"");
        for kmer in [b"TT", b"AA", b"GC", b"AA"] {
            acc.add(kmer, &s);
        }
        let mut out = Vec::new();
        acc.write_table(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "AA\t2\nGC\t1\nTT\t1\n");
    }

    #[test]
    fn sample_table_output_fills_zeros() {
        let mut acc = KmerAccumulator::for_mode(OutputMode::SampleTable);
        acc.add(b"GG", &sample(b"s2"));
        acc.add(b"CC", &sample(b"s1"));
        acc.add(b"GG", &sample(b"s1"));

        let mut out = Vec::new();
        acc.write_sample_table(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#kmer\ts1\ts2\nCC\t1\t0\nGG\t1\t1\n"
        );
    }
}
