use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::data::CoverageSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: Utf8PathBuf,
    pub lines: usize,
    pub hits: u64,
}

/// Executed lines and total hits, per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    files: Vec<FileSummary>,
}

impl CoverageSummary {
    /// Summarizes `set`, showing paths relative to `root` where possible.
    pub fn new(set: &CoverageSet, root: &Utf8Path) -> Self {
        let files = set
            .files()
            .iter()
            .map(|(path, lines)| FileSummary {
                path: path
                    .strip_prefix(root)
                    .map_or_else(|_| path.clone(), Utf8Path::to_path_buf),
                lines: lines.len(),
                hits: lines.values().sum(),
            })
            .collect();

        Self { files }
    }

    pub fn files(&self) -> &[FileSummary] {
        &self.files
    }

    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|file| file.lines).sum()
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .files
            .iter()
            .map(|file| file.path.as_str().len())
            .max()
            .unwrap_or(0)
            .max("total".len());

        writeln!(f, "{:<width$}  {:>7}  {:>9}", "file", "lines", "hits")?;
        for file in &self.files {
            writeln!(f, "{:<width$}  {:>7}  {:>9}", file.path.as_str(), file.lines, file.hits)?;
        }
        writeln!(f, "{:<width$}  {:>7}", "total", self.total_lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CoverageSlice, FileHits, SliceId};

    #[test]
    fn table_lists_files_relative_to_the_root() {
        let files = FileHits::from([
            (
                Utf8PathBuf::from("/project/app/core.py"),
                [(1, 4), (2, 4), (5, 1)].into(),
            ),
            (Utf8PathBuf::from("/project/app/util.py"), [(10, 2)].into()),
        ]);
        let mut set = CoverageSet::new();
        set.merge(CoverageSlice::new(SliceId::worker(0), files)).unwrap();

        let summary = CoverageSummary::new(&set, Utf8Path::new("/project"));
        insta::assert_snapshot!(summary.to_string(), @r"
        file           lines       hits
        app/core.py        3          9
        app/util.py        1          2
        total              4
        ");
    }
}
