//! Reference database set resolution.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::KmerBatchError;

/// Where the reference databases come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    /// Every file in the directory with the configured extension, sorted by name.
    Directory(PathBuf),
    /// Explicit files, in the order given.
    List(Vec<PathBuf>),
}

impl ReferenceSource {
    /// Interprets `--ref`: an existing directory, otherwise a comma-separated list.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if Path::new(value).is_dir() {
            return Self::Directory(PathBuf::from(value));
        }
        Self::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
        )
    }

    /// Resolves the ordered database list; an empty result is an error.
    pub fn resolve(&self, extension: &str) -> Result<Vec<PathBuf>, KmerBatchError> {
        let extension = extension.trim_start_matches('.');
        let refs = match self {
            Self::List(paths) => paths.clone(),
            Self::Directory(dir) => {
                let mut paths = Vec::new();
                for entry in fs::read_dir(dir).map_err(KmerBatchError::input(dir))? {
                    let path = entry.map_err(KmerBatchError::input(dir))?.path();
                    if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                        paths.push(path);
                    }
                }
                paths.sort();
                paths
            }
        };

        if refs.is_empty() {
            return Err(KmerBatchError::NoReferenceDatabases {
                source_desc: self.to_string(),
                extension: extension.to_string(),
            });
        }
        Ok(refs)
    }
}

impl std::fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::List(paths) => {
                let names: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_preserves_given_order() {
        let source = ReferenceSource::parse("z.udb, a.udb,,m.udb");
        assert_eq!(
            source.resolve("udb").unwrap(),
            vec![
                PathBuf::from("z.udb"),
                PathBuf::from("a.udb"),
                PathBuf::from("m.udb")
            ]
        );
    }

    #[test]
    fn directory_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.udb", "a.udb", "notes.txt", "c.udb"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("d.udb")).unwrap();

        let source = ReferenceSource::parse(dir.path().to_str().unwrap());
        assert!(matches!(source, ReferenceSource::Directory(_)));

        let names: Vec<_> = source
            .resolve(".udb")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.udb", "b.udb", "c.udb"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReferenceSource::Directory(dir.path().to_path_buf())
            .resolve("udb")
            .unwrap_err();
        assert!(matches!(err, KmerBatchError::NoReferenceDatabases { .. }));
    }

    #[test]
    fn blank_list_is_an_error() {
        let err = ReferenceSource::parse(" , ").resolve("udb").unwrap_err();
        assert!(matches!(err, KmerBatchError::NoReferenceDatabases { .. }));
    }
}
