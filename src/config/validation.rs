use crate::config::types::{
    Config, DedupParams, FetchConfig, PoolConfig, SitemapConfig, SkipConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_skip_config(&config.skip)?;
    validate_sitemap_config(&config.sitemap)?;
    validate_pool_config(&config.pool)?;
    validate_dedup_params(&config.dedup)?;

    if config.output.root.is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout must be at least 1 second".to_string(),
        ));
    }

    if config.retries < 1 || config.retries > 10 {
        return Err(ConfigError::Validation(format!(
            "retries must be between 1 and 10, got {}",
            config.retries
        )));
    }

    if !config.backoff_base.is_finite() || config.backoff_base < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-base must be a non-negative number of seconds, got {}",
            config.backoff_base
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_skip_config(config: &SkipConfig) -> Result<(), ConfigError> {
    if let Some(ext) = config.extensions.iter().find(|e| e.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "excluded extension cannot be blank, got '{}'",
            ext
        )));
    }

    if let Some(domain) = config.domains.iter().find(|d| !is_domain_like(d)) {
        return Err(ConfigError::Validation(format!(
            "excluded domain '{}' contains invalid characters",
            domain
        )));
    }

    Ok(())
}

fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sitemap path cannot be empty".to_string(),
        ));
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "sitemap max-depth must be >= 1".to_string(),
        ));
    }

    if config.max_sitemaps < 1 {
        return Err(ConfigError::Validation(
            "sitemap max-sitemaps must be >= 1".to_string(),
        ));
    }

    if config.top_level_limit < 1 {
        return Err(ConfigError::Validation(
            "sitemap top-level-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.target_timeout == 0 {
        return Err(ConfigError::Validation(
            "target-timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_dedup_params(params: &DedupParams) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&params.threshold) {
        return Err(ConfigError::Validation(format!(
            "dedup threshold must be within [0, 1], got {}",
            params.threshold
        )));
    }

    if !(params.error_rate > 0.0 && params.error_rate < 1.0) {
        return Err(ConfigError::Validation(format!(
            "dedup error-rate must be within (0, 1), got {}",
            params.error_rate
        )));
    }

    if params.shingle_size < 1 {
        return Err(ConfigError::Validation(
            "dedup shingle-size must be >= 1".to_string(),
        ));
    }

    if params.granularity != "word" && params.granularity != "char" {
        return Err(ConfigError::Validation(format!(
            "dedup granularity must be 'word' or 'char', got '{}'",
            params.granularity
        )));
    }

    Ok(())
}

/// Domain entries may be a bare name, an apex domain or a full host
fn is_domain_like(domain: &str) -> bool {
    !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
