#[cfg(feature = "simd_acceleration")]
use memchr::memmem;

/// Substring rules applied to raw block lines before a block is accepted.
pub const DEFAULT_EXCLUDES: &[&str] = &["debug.h"];

/// Include wins over exclude for a single line.
fn excluded_by<P, F>(line: &str, exclude: &[P], include: &[P], matches: F) -> bool
where
    F: Fn(&P, &str) -> bool,
{
    if include.iter().any(|p| matches(p, line)) {
        return false;
    }
    exclude.iter().any(|p| matches(p, line))
}

/// Check one line against plain substring lists, without building a
/// [`BlockFilter`].
pub fn is_excluded<S: AsRef<str>>(line: &str, exclude_patterns: &[S], include_patterns: &[S]) -> bool {
    excluded_by(line, exclude_patterns, include_patterns, |p, l| l.contains(p.as_ref()))
}

/// A single literal, searched with `memchr::memmem` when SIMD is enabled
struct Literal {
    #[cfg(feature = "simd_acceleration")]
    finder: memmem::Finder<'static>,
    #[cfg(not(feature = "simd_acceleration"))]
    text: String,
}

impl Literal {
    fn new(pattern: &str) -> Self {
        Literal {
            #[cfg(feature = "simd_acceleration")]
            finder: memmem::Finder::new(pattern.as_bytes()).into_owned(),
            #[cfg(not(feature = "simd_acceleration"))]
            text: pattern.to_string(),
        }
    }

    #[inline]
    fn is_match(&self, line: &str) -> bool {
        #[cfg(feature = "simd_acceleration")]
        {
            self.finder.find(line.as_bytes()).is_some()
        }
        #[cfg(not(feature = "simd_acceleration"))]
        {
            line.contains(&self.text)
        }
    }
}

/// Precompiled include/exclude rules shared by every parser in a run.
pub struct BlockFilter {
    exclude: Vec<Literal>,
    include: Vec<Literal>,
}

impl Default for BlockFilter {
    fn default() -> Self {
        BlockFilter::new(DEFAULT_EXCLUDES, &[] as &[&str])
    }
}

impl BlockFilter {
    pub fn new<S: AsRef<str>, T: AsRef<str>>(exclude: &[S], include: &[T]) -> Self {
        BlockFilter {
            exclude: exclude.iter().map(|p| Literal::new(p.as_ref())).collect(),
            include: include.iter().map(|p| Literal::new(p.as_ref())).collect(),
        }
    }

    /// Accepts everything
    pub fn none() -> Self {
        BlockFilter {
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }

    pub fn excludes_line(&self, line: &str) -> bool {
        excluded_by(line, &self.exclude, &self.include, Literal::is_match)
    }

    /// One excluded line discards the whole block.
    pub fn rejects<S: AsRef<str>>(&self, lines: &[S]) -> bool {
        lines.iter().any(|line| self.excludes_line(line.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_overrides_exclude() {
        assert!(!is_excluded("at log (debug.h:12) in engine.h", &["debug.h"], &["engine.h"]));
        assert!(is_excluded("at log (debug.h:12)", &["debug.h"], &["engine.h"]));
        assert!(!is_excluded("at run (engine.h:3)", &["debug.h"], &[]));
    }

    #[test]
    fn test_block_filter_matches_free_function() {
        let filter = BlockFilter::new(&["debug.h"], &["keep_me"]);
        for line in ["debug.h:1", "debug.h keep_me", "plain"] {
            assert_eq!(
                filter.excludes_line(line),
                is_excluded(line, &["debug.h"], &["keep_me"])
            );
        }
    }

    #[test]
    fn test_single_line_rejects_block() {
        let filter = BlockFilter::default();
        let block = ["Possible data race", "   at 0x1: trace (debug.h:40)", "   by 0x2: main (main.cc:3)"];
        assert!(filter.rejects(&block));
        assert!(!BlockFilter::none().rejects(&block));
    }
}
