//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_automation(config, &mut result);
        Self::validate_timeouts(config, &mut result);
        Self::validate_polling(config, &mut result);
        Self::validate_selectors(config, &mut result);
        Self::validate_resolution(config, &mut result);
        Self::validate_limits(config, &mut result);

        result
    }

    fn validate_automation(config: &Config, result: &mut ValidationResult) {
        for (path, value) in [
            ("automation.endpoint", &config.automation.endpoint),
            ("automation.target_url", &config.automation.target_url),
        ] {
            if url::Url::parse(value).is_err() {
                result.add_error(ValidationError::new(path, format!("Invalid URL: {}", value)));
            }
        }
    }

    fn validate_timeouts(config: &Config, result: &mut ValidationResult) {
        let t = &config.timeouts;
        for (path, value) in [
            ("timeouts.prepare_ms", t.prepare_ms),
            ("timeouts.submit_ms", t.submit_ms),
            ("timeouts.await_response_ms", t.await_response_ms),
            ("timeouts.extract_image_ms", t.extract_image_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "must be greater than 0"));
            }
        }
    }

    fn validate_polling(config: &Config, result: &mut ValidationResult) {
        let p = &config.polling;
        let t = &config.timeouts;

        if p.interval_ms == 0 {
            result.add_error(ValidationError::new(
                "polling.interval_ms",
                "must be greater than 0",
            ));
        }

        if p.stable_samples == 0 {
            result.add_error(ValidationError::new(
                "polling.stable_samples",
                "must be at least 1",
            ));
        }

        // Page-side waits that outlast the Coordinator deadline turn typed
        // page failures into bare timeouts.
        for (path, wait, deadline) in [
            ("polling.prepare_wait_ms", p.prepare_wait_ms, t.prepare_ms),
            ("polling.submit_wait_ms", p.submit_wait_ms, t.submit_ms),
            ("polling.response_max_wait_ms", p.response_max_wait_ms, t.await_response_ms),
        ] {
            if wait >= deadline {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("wait of {}ms is not shorter than the {}ms deadline", wait, deadline),
                ));
            }
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        let s = &config.selectors;
        for (path, list) in [
            ("selectors.prompt_input", &s.prompt_input),
            ("selectors.submit_button", &s.submit_button),
            ("selectors.assistant_message", &s.assistant_message),
            ("selectors.generated_image", &s.generated_image),
        ] {
            if list.is_empty() {
                result.add_error(ValidationError::new(path, "at least one selector is required"));
            }
            if list.iter().any(|sel| sel.trim().is_empty()) {
                result.add_error(ValidationError::new(path, "selectors cannot be blank"));
            }
        }

        if s.full_size_image.is_empty() {
            result.add_warning(ValidationWarning::new(
                "selectors.full_size_image",
                "interaction-triggered image discovery is disabled",
            ));
        }
    }

    fn validate_resolution(config: &Config, result: &mut ValidationResult) {
        for (i, rule) in config.resolution.rewrite_rules.iter().enumerate() {
            if let Err(e) = regex::Regex::new(&rule.pattern) {
                result.add_error(ValidationError::new(
                    format!("resolution.rewrite_rules[{}].pattern", i),
                    e.to_string(),
                ));
            }
        }

        if config.resolution.rewrite_rules.is_empty() {
            result.add_warning(ValidationWarning::new(
                "resolution.rewrite_rules",
                "URL-pattern transformation is disabled",
            ));
        }
    }

    fn validate_limits(config: &Config, result: &mut ValidationResult) {
        let l = &config.limits;
        if l.max_messages_per_chat < 2 {
            result.add_error(ValidationError::new(
                "limits.max_messages_per_chat",
                "must hold at least one exchange (2 messages)",
            ));
        }
        if l.ledger_capacity == 0 {
            result.add_error(ValidationError::new(
                "limits.ledger_capacity",
                "must be greater than 0",
            ));
        }
        if l.link_capacity == 0 {
            result.add_error(ValidationError::new(
                "limits.link_capacity",
                "must be greater than 0",
            ));
        }
        if l.max_messages_per_chat > 10_000 {
            result.add_warning(ValidationWarning::new(
                "limits.max_messages_per_chat",
                "very large histories are kept fully in memory",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
