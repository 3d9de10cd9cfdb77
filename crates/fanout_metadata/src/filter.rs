use regex::Regex;

/// A set of `-m/--match` patterns.
///
/// A test id matches the set when any pattern matches anywhere in it; an
/// empty set matches everything.
#[derive(Debug, Clone, Default)]
pub struct NameFilterSet {
    patterns: Vec<Regex>,
}

impl NameFilterSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, NameFilterError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| NameFilterError {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.is_empty() || self.patterns.iter().any(|pattern| pattern.is_match(name))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid `--match` pattern `{pattern}`: {source}")]
pub struct NameFilterError {
    pattern: String,
    #[source]
    source: regex::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_matches_everything() {
        let filter = NameFilterSet::new::<&str>(&[]).unwrap();
        assert!(filter.matches("test_mod.Case.test_anything"));
    }

    #[test]
    fn any_pattern_may_match() {
        let filter = NameFilterSet::new(&["auth", "^billing\\."]).unwrap();
        assert!(filter.matches("test_auth.LoginCase.test_ok"));
        assert!(filter.matches("billing.InvoiceCase.test_total"));
        assert!(!filter.matches("test_billing.InvoiceCase.test_total"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = NameFilterSet::new(&["("]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid `--match` pattern `(`"));
    }
}
