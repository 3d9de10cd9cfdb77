use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::data::{CoverageSet, CoverageSlice, DuplicateSliceError, SliceId};

const COMBINED_FILE_NAME: &str = "coverage.json";

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("Failed to create coverage directory `{path}`")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read coverage data from `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write coverage data to `{path}`")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Coverage data in `{path}` is malformed")]
    Malformed {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Duplicate(#[from] DuplicateSliceError),
}

/// The scratch directory one run's slices are exchanged through:
/// `<cache-dir>/run-<uuid>/coverage`.
#[derive(Debug, Clone)]
pub struct CoverageRun {
    run_dir: Utf8PathBuf,
    slice_dir: Utf8PathBuf,
}

impl CoverageRun {
    pub fn create(cache_dir: &Utf8Path) -> Result<Self, CoverageError> {
        let run_dir = cache_dir.join(format!("run-{}", uuid::Uuid::new_v4()));
        let slice_dir = run_dir.join("coverage");
        fs::create_dir_all(&slice_dir).map_err(|source| CoverageError::CreateDir {
            path: slice_dir.clone(),
            source,
        })?;

        tracing::debug!(dir = %slice_dir, "Created coverage directory");

        Ok(Self { run_dir, slice_dir })
    }

    /// Where each process writes its slice.
    pub fn slice_dir(&self) -> &Utf8Path {
        &self.slice_dir
    }

    /// Reads and merges every slice written so far.
    ///
    /// A slice file that cannot be read is skipped with a warning; a slice
    /// id seen twice is an error.
    pub fn collect(&self) -> Result<CoverageSet, CoverageError> {
        let entries = fs::read_dir(&self.slice_dir).map_err(|source| CoverageError::Read {
            path: self.slice_dir.clone(),
            source,
        })?;

        let mut paths: Vec<Utf8PathBuf> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.path()).ok())
            .filter(|path| path.extension() == Some("json"))
            .collect();
        paths.sort();

        let mut set = CoverageSet::new();
        for path in paths {
            match read_slice(&path) {
                Ok(slice) => set.merge(slice)?,
                Err(err) => tracing::warn!("{err}"),
            }
        }

        Ok(set)
    }

    /// Removes the run directory and everything in it.
    pub fn remove(self) {
        if let Err(err) = fs::remove_dir_all(&self.run_dir) {
            tracing::debug!(dir = %self.run_dir, "Failed to remove coverage directory: {err}");
        }
    }
}

pub fn slice_path(dir: &Utf8Path, id: &SliceId) -> Utf8PathBuf {
    dir.join(format!("{id}.json"))
}

pub fn write_slice(dir: &Utf8Path, slice: &CoverageSlice) -> Result<Utf8PathBuf, CoverageError> {
    let path = slice_path(dir, &slice.id);
    write_json(&path, slice)?;
    Ok(path)
}

pub fn read_slice(path: &Utf8Path) -> Result<CoverageSlice, CoverageError> {
    let content = fs::read_to_string(path).map_err(|source| CoverageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CoverageError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the combined data to `<cache-dir>/coverage.json`.
pub fn write_combined(cache_dir: &Utf8Path, set: &CoverageSet) -> Result<Utf8PathBuf, CoverageError> {
    let path = cache_dir.join(COMBINED_FILE_NAME);
    write_json(&path, set.files())?;
    Ok(path)
}

fn write_json(path: &Utf8Path, value: &impl serde::Serialize) -> Result<(), CoverageError> {
    let content = serde_json::to_string(value).map_err(|source| CoverageError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| CoverageError::Write {
        path: path.to_path_buf(),
        source,
    })
}
