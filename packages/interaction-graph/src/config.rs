use std::time::Duration;

/// Settings shared by every stage of one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub debug: bool,
    pub verbose: bool,
    /// Items fetched per listing in both stages. `None` means as many as available.
    pub fetch_limit: Option<usize>,
    /// Truncated subtrees expanded per submission. `None` expands all of them.
    pub expand_bound: Option<usize>,
    /// Cap on flattened comments processed per submission.
    pub max_comments_per_submission: Option<usize>,
    /// Pause after a user handle fails to resolve.
    pub resolution_cooldown: Duration,
    /// Pause after a single submission or comment fails to fetch.
    pub fetch_cooldown: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: false,
            fetch_limit: Some(1),
            expand_bound: Some(5),
            max_comments_per_submission: None,
            resolution_cooldown: Duration::from_secs(60),
            fetch_cooldown: Duration::from_secs(5),
        }
    }
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug runs keep submissions small so the graph stays readable.
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self.max_comments_per_submission = Some(40);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_fetch_limit(mut self, limit: Option<usize>) -> Self {
        self.fetch_limit = limit;
        self
    }

    pub fn with_expand_bound(mut self, bound: Option<usize>) -> Self {
        self.expand_bound = bound;
        self
    }

    pub fn with_comment_cap(mut self, cap: Option<usize>) -> Self {
        self.max_comments_per_submission = cap;
        self
    }

    pub fn with_cooldowns(mut self, resolution: Duration, fetch: Duration) -> Self {
        self.resolution_cooldown = resolution;
        self.fetch_cooldown = fetch;
        self
    }

    /// No pauses at all; for fixture-backed runs.
    pub fn without_cooldowns(self) -> Self {
        self.with_cooldowns(Duration::ZERO, Duration::ZERO)
    }
}

/// The two communities a crawl is seeded from.
///
/// Names are matched without regard to case, so a pair that differs only
/// by case collapses to a single community.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePair {
    first: String,
    second: String,
}

impl ReferencePair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// The distinct communities of the pair, first one first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let second = (!self.is_single_community()).then_some(self.second.as_str());
        std::iter::once(self.first.as_str()).chain(second)
    }

    /// Both names refer to the same community.
    pub fn is_single_community(&self) -> bool {
        self.first.eq_ignore_ascii_case(&self.second)
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, community: &str) -> bool {
        self.iter().any(|c| c.eq_ignore_ascii_case(community))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pair_ignores_case() {
        let pair = ReferencePair::new("makeupaddiction", "100pushups");
        assert!(pair.contains("MakeupAddiction"));
        assert!(pair.contains("100PUSHUPS"));
        assert!(!pair.contains("Fitness"));
    }

    #[test]
    fn test_pair_differing_only_by_case_collapses() {
        let pair = ReferencePair::new("makeupaddiction", "MAKEUPADDICTION");
        assert!(pair.is_single_community());
        assert_eq!(pair.iter().collect::<Vec<_>>(), vec!["makeupaddiction"]);

        let pair = ReferencePair::new("makeupaddiction", "100pushups");
        assert!(!pair.is_single_community());
        assert_eq!(pair.iter().count(), 2);
    }

    #[test]
    fn test_debug_caps_comments() {
        let config = CrawlConfig::new().debug();
        assert!(config.debug);
        assert_eq!(config.max_comments_per_submission, Some(40));
        assert_eq!(config.fetch_limit, Some(1));
    }
}
