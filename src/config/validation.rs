use crate::config::types::{Config, CrawlerConfig, ScopeConfig, UserAgentConfig};
use crate::url::{canonicalize, HostPattern};
use crate::ConfigError;
use url::Url;

/// Deepest crawl the configuration accepts
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// Largest worker pool the configuration accepts
pub const MAX_WORKERS: u32 = 256;

/// Validates the entire configuration
///
/// A configuration that fails here is fatal: the crawl does not start.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(config)?;
    validate_scope(&config.scope)?;
    Ok(())
}

fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        canonicalize(seed, None)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be at most {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.fetch_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be at most 10, got {}",
            config.max_retries
        )));
    }

    if config.respect_robots && config.robots_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "robots_ttl_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &Config) -> Result<(), ConfigError> {
    let paths = [
        ("database_path", &config.output.database_path),
        ("summary_path", &config.output.summary_path),
    ];

    for (name, path) in paths {
        if matches!(path.as_deref(), Some("")) {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

fn validate_scope(scope: &ScopeConfig) -> Result<(), ConfigError> {
    for pattern in scope.allow.iter().chain(scope.deny.iter()) {
        validate_host_pattern(pattern)?;
    }
    Ok(())
}

/// Validates a scope pattern: an exact host or `*.` followed by a host
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    let host = match HostPattern::parse(pattern) {
        HostPattern::Exact(host) | HostPattern::Subdomains(host) => host,
    };

    let labels_ok = !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if !labels_ok {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' is not a host or *.host pattern",
            pattern
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}
