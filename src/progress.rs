//! Progress reporting for extraction and search runs.
//!
//! Both components hand snapshots to a caller-supplied callback; the binary
//! turns them into `--verbose` lines on stderr.
//!
//! # Example
//!
//! ```rust
//! use kmerbatch::progress::SearchClock;
//!
//! let mut clock = SearchClock::new(4, 100);
//! assert!(clock.snapshot(0).eta().is_none());
//! clock.complete_search();
//! assert!(clock.snapshot(25).eta().is_some());
//! ```

use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::Serialize;

/// Progress snapshot during k-mer extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractProgress {
    /// Header records seen so far.
    pub records: u64,
    /// K-mer positions scanned so far.
    pub kmers_scanned: u64,
}

/// Progress snapshot during a batch search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchProgress {
    pub sequences_processed: u64,
    pub total_sequences: u64,
    pub completed_searches: u64,
    pub total_searches: u64,
    #[serde(serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl SearchProgress {
    /// Estimated time remaining; `None` until one search has completed.
    pub fn eta(&self) -> Option<Duration> {
        if self.completed_searches == 0 {
            return None;
        }
        let remaining = self.total_searches.saturating_sub(self.completed_searches);
        let per_search = self.elapsed.as_secs_f64() / self.completed_searches as f64;
        Some(Duration::from_secs_f64(per_search * remaining as f64))
    }
}

impl fmt::Display for SearchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Elapsed {}; sequences {} of {}; searches {} of {}; remaining ",
            format_duration(self.elapsed),
            self.sequences_processed,
            self.total_sequences,
            self.completed_searches,
            self.total_searches,
        )?;
        match self.eta() {
            Some(eta) => f.write_str(&format_duration(eta)),
            None => f.write_str("Unknown"),
        }
    }
}

/// Wall clock and search counter for one orchestrator run.
#[derive(Debug)]
pub struct SearchClock {
    start: Instant,
    total_sequences: u64,
    total_searches: u64,
    completed_searches: u64,
}

impl SearchClock {
    pub fn new(total_searches: u64, total_sequences: u64) -> Self {
        Self {
            start: Instant::now(),
            total_sequences,
            total_searches,
            completed_searches: 0,
        }
    }

    /// Records one finished (chunk, reference) search.
    pub fn complete_search(&mut self) {
        self.completed_searches += 1;
    }

    pub fn snapshot(&self, sequences_processed: u64) -> SearchProgress {
        SearchProgress {
            sequences_processed,
            total_sequences: self.total_sequences,
            completed_searches: self.completed_searches,
            total_searches: self.total_searches,
            elapsed: self.start.elapsed(),
        }
    }
}

/// `H:MM:SS` formatting for progress lines.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn as_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(completed: u64, total: u64, elapsed_secs: u64) -> SearchProgress {
        SearchProgress {
            sequences_processed: 0,
            total_sequences: 0,
            completed_searches: completed,
            total_searches: total,
            elapsed: Duration::from_secs(elapsed_secs),
        }
    }

    #[test]
    fn eta_unknown_before_first_search() {
        let p = progress(0, 10, 30);
        assert!(p.eta().is_none());
        assert!(p.to_string().ends_with("remaining Unknown"));
    }

    #[test]
    fn eta_scales_elapsed_by_remaining_searches() {
        let p = progress(2, 10, 60);
        assert_eq!(p.eta(), Some(Duration::from_secs(240)));
    }

    #[test]
    fn eta_zero_when_done() {
        assert_eq!(progress(4, 4, 60).eta(), Some(Duration::ZERO));
    }

    #[test]
    fn clock_counts_searches() {
        let mut clock = SearchClock::new(3, 9);
        clock.complete_search();
        clock.complete_search();
        let p = clock.snapshot(6);
        assert_eq!(p.completed_searches, 2);
        assert_eq!(p.total_searches, 3);
        assert_eq!(p.sequences_processed, 6);
    }

    #[test]
    fn durations_format_as_clock() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_duration(Duration::ZERO), "0:00:00");
    }
}
