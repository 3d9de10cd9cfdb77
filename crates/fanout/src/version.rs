use std::fmt;

/// Version information for the running binary.
pub(crate) struct VersionInfo {
    version: &'static str,
    commit: Option<&'static str>,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.version)?;
        if let Some(commit) = self.commit {
            write!(f, " ({commit})")?;
        }
        Ok(())
    }
}

/// `FANOUT_COMMIT_HASH` is set by release builds.
pub(crate) fn version() -> Option<VersionInfo> {
    let version = option_env!("CARGO_PKG_VERSION")?;
    Some(VersionInfo {
        version,
        commit: option_env!("FANOUT_COMMIT_HASH").filter(|hash| !hash.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_follows_the_version() {
        let info = VersionInfo {
            version: "0.1.0",
            commit: Some("abc1234"),
        };
        assert_eq!(info.to_string(), "0.1.0 (abc1234)");
    }
}
