use crate::config::types::{
    ClientConfig, Config, CrawlerConfig, EnrichmentConfig, OutputConfig, TargetConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_client_config(&config.client)?;
    validate_output_config(&config.output)?;
    validate_enrichment_config(&config.enrichment)?;
    Ok(())
}

/// Validates the crawl target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    if config.author_id.is_empty() {
        return Err(ConfigError::Validation(
            "author_id cannot be empty".to_string(),
        ));
    }

    if !config.author_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Validation(format!(
            "author_id must contain only digits, got '{}'",
            config.author_id
        )));
    }

    if config.post_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "post_ids cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl limits and pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.global_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "global_limit must be >= 1, got {}",
            config.global_limit
        )));
    }

    if let Some(limit) = config.per_post_limit {
        if limit < 1 {
            return Err(ConfigError::Validation(format!(
                "per_post_limit must be >= 1 when set, got {}",
                limit
            )));
        }
    }

    if config.request_interval_seconds > 3600 {
        return Err(ConfigError::Validation(format!(
            "request_interval_seconds must be <= 3600, got {}",
            config.request_interval_seconds
        )));
    }

    if config.brand_lookup_pages < 1 || config.brand_lookup_pages > 10 {
        return Err(ConfigError::Validation(format!(
            "brand_lookup_pages must be between 1 and 10, got {}",
            config.brand_lookup_pages
        )));
    }

    Ok(())
}

/// Validates remote client settings
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    validate_http_url("client.base_url", &config.base_url)?;

    if config.cookie.trim().is_empty() {
        return Err(ConfigError::Validation("cookie cannot be empty".to_string()));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("directory", &config.directory),
        ("name", &config.name),
        ("progress_file", &config.progress_file),
        ("summary_file", &config.summary_file),
        ("sentiment_file", &config.sentiment_file),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!(
                "output.{} cannot be empty",
                field
            )));
        }
    }

    Ok(())
}

/// Validates the sentiment enrichment section (only when enabled)
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.api_key.is_empty() {
        return Err(ConfigError::Validation(
            "enrichment.api_key cannot be empty when enrichment is enabled".to_string(),
        ));
    }

    validate_http_url("enrichment.base_url", &config.base_url)?;

    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "enrichment.workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "enrichment.queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
