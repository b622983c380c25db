use crate::config::{parse_duration, Config, SCHEMA_VERSION};
use crate::error::{CareseekError, Result, ValidationError};
use regex::Regex;

/// Upper bound on the directory result cap
const MAX_RESULTS_LIMIT: usize = 500;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_services(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_ranking(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CareseekError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }
    }

    fn validate_services(config: &Config, errors: &mut Vec<ValidationError>) {
        let services = &config.services;

        // Empty means "not configured", which is allowed
        for (path, url) in [
            ("services.recommendation_url", &services.recommendation_url),
            ("services.directory_url", &services.directory_url),
            ("services.ranking_url", &services.ranking_url),
        ] {
            if !url.is_empty() && !Self::matches(r"^https?://\S+$", url) {
                errors.push(ValidationError::new(
                    path,
                    format!("URL must start with http:// or https://, got '{}'", url),
                ));
            }
        }

        if !Self::matches(r"^[A-Za-z_][A-Za-z0-9_]*$", &services.api_key_env) {
            errors.push(ValidationError::new(
                "services.api_key_env",
                format!(
                    "Not a valid environment variable name: '{}'",
                    services.api_key_env
                ),
            ));
        }

        match parse_duration(&services.timeout) {
            Ok(timeout) if timeout.is_zero() => errors.push(ValidationError::new(
                "services.timeout",
                "Timeout must be greater than 0",
            )),
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::new(
                "services.timeout",
                format!("Invalid duration format: {}", services.timeout),
            )),
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if search.max_results == 0 || search.max_results > MAX_RESULTS_LIMIT {
            errors.push(ValidationError::new(
                "search.max_results",
                format!(
                    "Max results must be between 1 and {}, got {}",
                    MAX_RESULTS_LIMIT, search.max_results
                ),
            ));
        }

        if search.page_size == 0 {
            errors.push(ValidationError::new(
                "search.page_size",
                "Page size must be greater than 0",
            ));
        }

        if !Self::matches(r"^[A-Z]{2}$", &search.default_state) {
            errors.push(ValidationError::new(
                "search.default_state",
                format!(
                    "State must be a two-letter code, got '{}'",
                    search.default_state
                ),
            ));
        }

        if search.default_city.trim().is_empty() {
            errors.push(ValidationError::new(
                "search.default_city",
                "Default city cannot be empty",
            ));
        }

        if search.default_description.trim().is_empty() {
            errors.push(ValidationError::new(
                "search.default_description",
                "Default description cannot be empty",
            ));
        }
    }

    fn validate_ranking(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Some(number) = &config.ranking.pinned_registry_number {
            if !Self::matches(r"^\d+$", number) {
                errors.push(ValidationError::new(
                    "ranking.pinned_registry_number",
                    format!("Registry number must be digits, got '{}'", number),
                ));
            }
        }
    }

    fn matches(pattern: &str, value: &str) -> bool {
        Regex::new(pattern)
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }
}
