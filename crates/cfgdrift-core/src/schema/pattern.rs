//! Glob patterns over config lines and config paths.
//!
//! Two pattern flavours share one syntax per element (a `globset` glob):
//!
//! - [`LinePattern`] matches the leading tokens of a CLI statement:
//!   `"access-list *"` matches `access-list 101 permit ip any any`.
//! - [`PathPattern`] matches a [`ConfigPath`] segment by segment. Segments are
//!   written `/`-separated and `**` stands for any number of segments:
//!   `"/ip access-list */**"`. Globs inside a segment may cross `/`, so
//!   `"interface *"` matches the segment `interface Gi0/1`.

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;

use crate::model::ConfigPath;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

fn compile(glob: &str, source: &str, case_insensitive: bool) -> Result<GlobMatcher, PatternError> {
    GlobBuilder::new(glob)
        .case_insensitive(case_insensitive)
        .literal_separator(false)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| PatternError {
            pattern: source.to_string(),
            reason: e.to_string(),
        })
}

/// Token-wise glob over the start of a statement
#[derive(Debug, Clone)]
pub struct LinePattern {
    source: String,
    tokens: Vec<GlobMatcher>,
    /// Token positions written without glob metacharacters
    literal: Vec<bool>,
}

impl LinePattern {
    pub fn parse(source: &str, case_insensitive: bool) -> Result<Self, PatternError> {
        let tokens = source
            .split_whitespace()
            .map(|t| compile(t, source, case_insensitive))
            .collect::<Result<Vec<_>, _>>()?;
        if tokens.is_empty() {
            return Err(PatternError {
                pattern: source.to_string(),
                reason: "empty line pattern".to_string(),
            });
        }
        let literal = source
            .split_whitespace()
            .map(|t| !t.contains(['*', '?', '[', '{']))
            .collect();
        Ok(Self {
            source: source.to_string(),
            tokens,
            literal,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Positions of the tokens the pattern names verbatim (keywords)
    pub fn literal_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.literal
            .iter()
            .enumerate()
            .filter_map(|(idx, literal)| literal.then_some(idx))
    }

    /// Number of tokens the pattern consumes
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The statement starts with tokens matching the pattern
    pub fn matches_prefix(&self, tokens: &[&str]) -> bool {
        tokens.len() >= self.tokens.len()
            && self
                .tokens
                .iter()
                .zip(tokens)
                .all(|(glob, token)| glob.is_match(token))
    }

    /// The statement consists exactly of tokens matching the pattern
    pub fn matches_exact(&self, tokens: &[&str]) -> bool {
        tokens.len() == self.tokens.len() && self.matches_prefix(tokens)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    AnyDepth,
    Glob(GlobMatcher),
}

/// Segment-wise glob over a config path
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// `"/"` alone (or an empty string) matches only the root
    pub fn parse(source: &str, case_insensitive: bool) -> Result<Self, PatternError> {
        let segments = source
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "**" {
                    Ok(Segment::AnyDepth)
                } else {
                    compile(s, source, case_insensitive).map(Segment::Glob)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &ConfigPath) -> bool {
        self.matches_segments(path.segments())
    }

    /// Wildcard matching with single-point backtracking on the last `**`
    pub fn matches_segments(&self, segments: &[String]) -> bool {
        let (mut p, mut s) = (0usize, 0usize);
        let mut backtrack: Option<(usize, usize)> = None;

        while s < segments.len() {
            match self.segments.get(p) {
                Some(Segment::AnyDepth) => {
                    backtrack = Some((p, s));
                    p += 1;
                }
                Some(Segment::Glob(glob)) if glob.is_match(&segments[s]) => {
                    p += 1;
                    s += 1;
                }
                _ => match backtrack {
                    Some((star_p, star_s)) => {
                        p = star_p + 1;
                        s = star_s + 1;
                        backtrack = Some((star_p, star_s + 1));
                    }
                    None => return false,
                },
            }
        }

        self.segments[p.min(self.segments.len())..]
            .iter()
            .all(|seg| matches!(seg, Segment::AnyDepth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> ConfigPath {
        ConfigPath::from_segments(segments.iter().copied())
    }

    #[test]
    fn test_line_pattern_prefix_and_exact() {
        let pattern = LinePattern::parse("access-list *", false).unwrap();
        assert!(pattern.matches_prefix(&["access-list", "101", "permit", "ip"]));
        assert!(!pattern.matches_prefix(&["access-list"]));
        assert!(!pattern.matches_exact(&["access-list", "101", "permit"]));
        assert!(pattern.matches_exact(&["access-list", "101"]));
    }

    #[test]
    fn test_line_pattern_case_insensitive() {
        let pattern = LinePattern::parse("Building configuration*", true).unwrap();
        assert!(pattern.matches_exact(&["building", "configuration..."]));
    }

    #[test]
    fn test_line_pattern_literal_positions() {
        let pattern = LinePattern::parse("ip access-list extended *", true).unwrap();
        assert_eq!(pattern.literal_positions().collect::<Vec<_>>(), vec![0, 1, 2]);
        let pattern = LinePattern::parse("route-map * permit*", true).unwrap();
        assert_eq!(pattern.literal_positions().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_path_pattern_any_depth() {
        let pattern = PathPattern::parse("/ip access-list */**", false).unwrap();
        assert!(pattern.matches(&path(&["ip access-list extended EDGE"])));
        assert!(pattern.matches(&path(&["ip access-list extended EDGE", "permit tcp any any"])));
        assert!(!pattern.matches(&path(&["interface Gi0/1"])));
    }

    #[test]
    fn test_path_pattern_glob_crosses_slash_inside_segment() {
        let pattern = PathPattern::parse("/interface */description", false).unwrap();
        assert!(pattern.matches(&path(&["interface Gi0/1", "description"])));
        assert!(!pattern.matches(&path(&["interface Gi0/1", "mtu"])));
    }

    #[test]
    fn test_path_pattern_leading_any_depth() {
        let pattern = PathPattern::parse("/**/description", false).unwrap();
        assert!(pattern.matches(&path(&["description"])));
        assert!(pattern.matches(&path(&["a", "b", "description"])));
        assert!(!pattern.matches(&path(&["a", "description", "b"])));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/", false).unwrap();
        assert!(pattern.matches(&ConfigPath::root()));
        assert!(!pattern.matches(&path(&["system"])));
    }

    #[test]
    fn test_invalid_glob_reports_pattern() {
        let err = LinePattern::parse("route-map [", false).unwrap_err();
        assert_eq!(err.pattern, "route-map [");
    }
}
