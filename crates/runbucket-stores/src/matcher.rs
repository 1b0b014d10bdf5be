//! Glob matching with bucket `match_glob` semantics.

use glob::{MatchOptions, Pattern};
use runbucket_abstraction::{StoreError, StoreResult};

/// `*` and `?` stay within one `/`-separated segment; `**` spans segments.
const OBJECT_NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled listing glob.
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    pattern: Option<Pattern>,
}

impl GlobMatcher {
    /// Compiles `pattern`; `None` matches every object.
    pub fn compile(pattern: Option<&str>) -> StoreResult<Self> {
        let pattern = pattern
            .map(|p| {
                Pattern::new(p).map_err(|e| StoreError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, object_name: &str) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|p| p.matches_with(object_name, OBJECT_NAME_MATCH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_does_not_cross_separator() {
        let m = GlobMatcher::compile(Some("run1/*/config.json")).unwrap();
        assert!(m.matches("run1/abc123/config.json"));
        assert!(!m.matches("run1/abc123/nested/config.json"));
        assert!(!m.matches("run2/abc123/config.json"));
    }

    #[test]
    fn test_digit_classes() {
        let m = GlobMatcher::compile(Some(
            "run1/abc/states/test/production/epoch_[0-9][0-9][0-9][0-9].pkl",
        ))
        .unwrap();
        assert!(m.matches("run1/abc/states/test/production/epoch_0042.pkl"));
        assert!(!m.matches("run1/abc/states/test/production/epoch_042.pkl"));
        assert!(!m.matches("run1/abc/states/test/production/epoch_abcd.pkl"));
        assert!(!m.matches("run1/abc/states/test/production/epoch_0042.npz"));
    }

    #[test]
    fn test_no_pattern_matches_everything() {
        let m = GlobMatcher::compile(None).unwrap();
        assert!(m.matches("anything/at/all"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = GlobMatcher::compile(Some("run1/[")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPattern { .. }));
    }
}
