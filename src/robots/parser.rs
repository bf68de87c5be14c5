//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; only the
//! Crawl-delay directive, which it does not expose, is read here.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Longest Crawl-delay honored; larger values are clamped to it
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Parsed robots.txt rules for one host
#[derive(Debug, Clone)]
pub struct RobotsRules {
    content: String,
    allow_all: bool,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Rules that permit everything
    ///
    /// Used when a host has no robots.txt or when fetching it failed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check
    /// * `user_agent` - Product token (e.g. "PoliteCrawler"), not the full header
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the Crawl-delay that applies to the given user agent token
    ///
    /// A group naming the agent takes precedence over the `*` group. Groups are
    /// runs of consecutive `User-agent` lines followed by their directives.
    /// The result never exceeds `MAX_CRAWL_DELAY`.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_directives = false;
        let mut specific: Option<f64> = None;
        let mut wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_directives {
                        group.clear();
                        in_directives = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_directives = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        specific.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        wildcard.get_or_insert(delay);
                    }
                }
                _ => in_directives = true,
            }
        }

        specific.or(wildcard).map(|secs| {
            Duration::try_from_secs_f64(secs)
                .unwrap_or(MAX_CRAWL_DELAY)
                .min(MAX_CRAWL_DELAY)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = RobotsRules::allow_all();
        assert!(robots.is_allowed("https://a.test/any/path", "TestBot"));
        assert!(robots.is_allowed("/admin", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = RobotsRules::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("https://a.test/", "TestBot"));
        assert!(!robots.is_allowed("https://a.test/page", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = RobotsRules::from_content("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed("https://a.test/", "TestBot"));
        assert!(robots.is_allowed("https://a.test/page", "TestBot"));
        assert!(!robots.is_allowed("https://a.test/admin", "TestBot"));
        assert!(!robots.is_allowed("https://a.test/admin/users", "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let robots =
            RobotsRules::from_content("User-agent: *\nDisallow: /private\nAllow: /private/public");
        assert!(!robots.is_allowed("https://a.test/private", "TestBot"));
        assert!(robots.is_allowed("https://a.test/private/public", "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let robots =
            RobotsRules::from_content("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed("https://a.test/page", "GoodBot"));
        assert!(!robots.is_allowed("https://a.test/page", "BadBot"));
    }

    #[test]
    fn test_garbage_content_allows() {
        let robots = RobotsRules::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed("https://a.test/any/path", "TestBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = RobotsRules::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_specific_agent() {
        let robots = RobotsRules::from_content(
            "User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(5)));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_after_other_directives() {
        let robots = RobotsRules::from_content(
            "User-agent: *\nDisallow: /tmp\nCrawl-delay: 3\n\nUser-agent: OtherBot\nCrawl-delay: 9",
        );
        assert_eq!(robots.crawl_delay("TestBot"), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let robots = RobotsRules::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotB"), Some(Duration::from_secs(3)));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_decimal_and_case() {
        let robots = RobotsRules::from_content("user-agent: testbot\ncrawl-delay: 2.5");
        assert_eq!(
            robots.crawl_delay("TestBot"),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_crawl_delay_is_clamped() {
        let robots = RobotsRules::from_content("User-agent: *\nCrawl-delay: 1e20");
        assert_eq!(robots.crawl_delay("TestBot"), Some(MAX_CRAWL_DELAY));

        let robots = RobotsRules::from_content("User-agent: *\nCrawl-delay: 172800");
        assert_eq!(robots.crawl_delay("TestBot"), Some(MAX_CRAWL_DELAY));
    }

    #[test]
    fn test_crawl_delay_none() {
        let robots = RobotsRules::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), None);
        assert_eq!(RobotsRules::allow_all().crawl_delay("TestBot"), None);
    }
}
