/// Case-insensitive literal substring matcher
///
/// The pattern is lower-cased once; each candidate is lower-cased before the
/// comparison. The pattern is never interpreted as a regular expression.
///
/// # Examples
///
/// ```
/// use sitemap_tally::tally::PatternMatcher;
///
/// let matcher = PatternMatcher::new("ABC");
/// assert!(matcher.matches("https://a.com/product-abc"));
/// assert!(!matcher.matches("https://a.com/other"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatcher {
    needle: String,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Self {
        Self {
            needle: pattern.to_lowercase(),
        }
    }

    /// Returns true if `candidate` contains the pattern, ignoring case
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.to_lowercase().contains(&self.needle)
    }
}
