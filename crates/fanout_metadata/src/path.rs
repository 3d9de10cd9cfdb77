use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Resolves `path` against `cwd` and normalizes `.` and `..` lexically.
pub fn absolute(path: impl AsRef<Utf8Path>, cwd: impl AsRef<Utf8Path>) -> Utf8PathBuf {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.as_ref().join(path)
    };

    let mut normalized = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_joined_and_normalized() {
        assert_eq!(
            absolute("./tests/../suite", "/work/project"),
            Utf8PathBuf::from("/work/project/suite")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        assert_eq!(absolute("/tmp/suite", "/work"), Utf8PathBuf::from("/tmp/suite"));
    }
}
