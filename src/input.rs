//! Where the k-mer extractor reads FASTA from.
//!
//! A path of `-` means standard input, so the extractor can run at the end
//! of a pipe behind a linearization step:
//!
//! ```rust
//! use kmerbatch::input::Input;
//! use std::path::Path;
//!
//! assert_eq!(Input::from(Path::new("-")), Input::Stdin);
//! assert_eq!(Input::from(Path::new("reads.fa")).label(), Path::new("reads.fa"));
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::error::KmerBatchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Stdin,
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl Input {
    /// Path used in error messages; `<stdin>` for standard input.
    pub fn label(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Stdin => Path::new("<stdin>"),
        }
    }

    /// Opens a line reader over the source.
    ///
    /// With the `gzip` feature, a file whose name ends in `.gz` is
    /// decompressed as it is read (concatenated members included).
    pub fn open(&self) -> Result<Box<dyn BufRead>, KmerBatchError> {
        let Self::File(path) = self else {
            return Ok(Box::new(io::stdin().lock()));
        };
        let file = File::open(path).map_err(KmerBatchError::input(path))?;
        Ok(reader_for(path, file))
    }
}

#[cfg(feature = "gzip")]
fn reader_for(path: &Path, file: File) -> Box<dyn BufRead> {
    if path.extension().is_some_and(|ext| ext == "gz") {
        return Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)));
    }
    Box::new(BufReader::new(file))
}

#[cfg(not(feature = "gzip"))]
fn reader_for(_path: &Path, file: File) -> Box<dyn BufRead> {
    Box::new(BufReader::new(file))
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label().display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn dash_selects_stdin() {
        assert_eq!(Input::from(Path::new("-")), Input::Stdin);
        assert_eq!(Input::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn other_paths_are_files() {
        let input = Input::from(Path::new("./-reads.fa"));
        assert_eq!(input, Input::File(PathBuf::from("./-reads.fa")));
        assert_eq!(input.to_string(), "./-reads.fa");
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let Err(err) = Input::from(Path::new("/nonexistent/q.fa")).open() else {
            panic!("opening a missing file should fail");
        };
        assert!(err.to_string().contains("/nonexistent/q.fa"));
    }

    #[test]
    fn plain_file_is_read_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b">a\nACGT\n").unwrap();

        let mut text = String::new();
        Input::from(file.path())
            .open()
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, ">a\nACGT\n");
    }
}
