//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::finish(Config::default())),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(Self::finish(config))
    }

    /// Resolve `~` in path-valued settings.
    fn finish(mut config: Config) -> Config {
        config.storage.path = Self::expand_pathbuf(&config.storage.path);
        config.logging.dir = config.logging.dir.as_deref().map(Self::expand_pathbuf);
        config
    }

    fn expand_pathbuf(path: &Path) -> PathBuf {
        PathBuf::from(Self::expand_path(&path.to_string_lossy()))
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.pagepilot`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.polling.interval_ms, 250);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[limits]").unwrap();
        writeln!(file, "max_messages_per_chat = 20").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.limits.max_messages_per_chat, 20);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/pagepilot.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/pagepilot.toml")).unwrap();
        assert_eq!(config.timeouts.submit_ms, 15_000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_tilde_in_storage_path_is_expanded() {
        let config = ConfigLoader::load_str(
            r#"
            [storage]
            path = "~/.pagepilot-test/state"
            "#,
        )
        .unwrap();
        assert!(!config.storage.path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("PAGEPILOT_TEST_ENDPOINT", "http://127.0.0.1:9333");
        }
        let config = ConfigLoader::load_str(
            r#"
            [automation]
            endpoint = "${PAGEPILOT_TEST_ENDPOINT}"
            "#,
        )
        .unwrap();
        assert_eq!(config.automation.endpoint, "http://127.0.0.1:9333");
        unsafe {
            std::env::remove_var("PAGEPILOT_TEST_ENDPOINT");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${PAGEPILOT_NONEXISTENT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }
}
