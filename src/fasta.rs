//! Line-level FASTA handling.
//!
//! Both components read FASTA one physical line at a time. Nothing here
//! reassembles a wrapped sequence: callers that need one sequence per line
//! must linearize their input first.

use std::io::BufRead;

/// Marker that starts every header line.
pub const HEADER_MARKER: u8 = b'>';

/// A single physical line of FASTA input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// A header line; holds the identifier token (possibly empty).
    Header(&'a [u8]),
    /// A sequence-body line with trailing whitespace removed.
    Body(&'a [u8]),
}

impl<'a> Line<'a> {
    /// Classifies a raw line (newline included or not).
    ///
    /// ```
    /// use kmerbatch::fasta::Line;
    ///
    /// assert_eq!(Line::parse(b">s1_7 desc\n"), Line::Header(b"s1_7"));
    /// assert_eq!(Line::parse(b"ACGT \r\n"), Line::Body(b"ACGT"));
    /// ```
    pub fn parse(raw: &'a [u8]) -> Self {
        match raw.split_first() {
            Some((&HEADER_MARKER, rest)) => Self::Header(identifier(rest)),
            _ => Self::Body(raw.trim_ascii_end()),
        }
    }

    pub const fn is_header(&self) -> bool {
        matches!(self, Self::Header(_))
    }
}

/// Token after the header marker, up to the first whitespace.
fn identifier(rest: &[u8]) -> &[u8] {
    rest.split(u8::is_ascii_whitespace)
        .find(|token| !token.is_empty())
        .unwrap_or_default()
}

/// Derives a QIIME-style sample identifier (`SAMPLEID_seqnum`).
///
/// Returns the whole identifier when it has no underscore.
///
/// ```
/// use kmerbatch::fasta::sample_id;
///
/// assert_eq!(sample_id(b"gut01_1523"), b"gut01");
/// assert_eq!(sample_id(b"plain"), b"plain");
/// ```
pub fn sample_id(seq_id: &[u8]) -> &[u8] {
    seq_id.split(|&b| b == b'_').next().unwrap_or_default()
}

/// Tracks which body lines terminate a record.
///
/// A record's body is complete when its last body line is followed by a
/// header or by end of input. Blank lines never open a body. Feed lines in
/// order with [`push`](Self::push), then call [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct TerminatorTracker {
    pending_body: bool,
}

impl TerminatorTracker {
    pub const fn new() -> Self {
        Self {
            pending_body: false,
        }
    }

    /// Registers the next line; returns `true` if it closes an open body.
    pub fn push(&mut self, line: &Line<'_>) -> bool {
        match line {
            Line::Header(_) => std::mem::take(&mut self.pending_body),
            Line::Body(seq) => {
                self.pending_body |= !seq.is_empty();
                false
            }
        }
    }

    /// Call at end of input; returns `true` if a body was still open.
    pub fn finish(&mut self) -> bool {
        std::mem::take(&mut self.pending_body)
    }
}

/// Counts sequence terminators in a FASTA stream.
pub fn count_sequences<R: BufRead>(mut reader: R) -> std::io::Result<u64> {
    let mut tracker = TerminatorTracker::new();
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if tracker.push(&Line::parse(&buf)) {
            count += 1;
        }
    }
    if tracker.finish() {
        count += 1;
    }

    Ok(count)
}
