use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Hit counts per line, per source file.
pub type FileHits = BTreeMap<Utf8PathBuf, BTreeMap<u32, u64>>;

/// Names the process a [`CoverageSlice`] was collected in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliceId(String);

impl SliceId {
    pub fn worker(worker_id: usize) -> Self {
        Self(format!("worker-{worker_id}"))
    }

    /// The slice collected by the in-process sequential runner.
    pub fn sequential() -> Self {
        Self("sequential".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The line hits collected by one process over its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSlice {
    pub id: SliceId,
    pub files: FileHits,
}

impl CoverageSlice {
    pub const fn new(id: SliceId, files: FileHits) -> Self {
        Self { id, files }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Coverage slice `{0}` was already merged")]
pub struct DuplicateSliceError(pub SliceId);

/// The union of any number of slices.
///
/// Merging sums hit counts line by line, so the result does not depend on
/// the order slices arrive in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSet {
    merged: BTreeSet<SliceId>,
    files: FileHits,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, slice: CoverageSlice) -> Result<(), DuplicateSliceError> {
        if self.merged.contains(&slice.id) {
            return Err(DuplicateSliceError(slice.id));
        }

        for (file, lines) in slice.files {
            let target = self.files.entry(file).or_default();
            for (line, hits) in lines {
                *target.entry(line).or_default() += hits;
            }
        }
        self.merged.insert(slice.id);

        Ok(())
    }

    pub fn files(&self) -> &FileHits {
        &self.files
    }

    pub fn slices(&self) -> impl Iterator<Item = &SliceId> {
        self.merged.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn hits(&self, file: &Utf8Path, line: u32) -> u64 {
        self.files
            .get(file)
            .and_then(|lines| lines.get(&line))
            .copied()
            .unwrap_or(0)
    }
}
