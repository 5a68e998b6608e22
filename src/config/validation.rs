use crate::config::types::{CrawlConfig, CrawlerConfig, ExtractionConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

const MAX_CONCURRENCY: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_seeds(&config.seeds)?;
    validate_crawler_config(&config.crawler)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates seed URLs: at least one, each absolute http(s) with a host
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' has no host",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32

    if config.per_host_concurrency < 1 || config.per_host_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "per_host_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.per_host_concurrency
        )));
    }

    if config.global_concurrency < 1 || config.global_concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "global_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.global_concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.path_exclusions.iter().any(|e| e.is_empty()) {
        return Err(ConfigError::Validation(
            "path_exclusions cannot contain empty entries".to_string(),
        ));
    }

    if let Some(scope) = &config.host_scope {
        if scope.trim().is_empty() {
            return Err(ConfigError::Validation(
                "host_scope cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the tag allowlist
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    for tag in &config.tags {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "tag names must be non-empty and alphanumeric, got '{}'",
                tag
            )));
        }
    }

    if config.enabled && config.tags.is_empty() {
        return Err(ConfigError::Validation(
            "extraction is enabled but the tag list is empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}
