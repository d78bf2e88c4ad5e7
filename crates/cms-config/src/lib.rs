//! Configuration management for the site CMS.
//!
//! Parses `cms.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `analytics.code`

mod expand;

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override database file path.
    pub database: Option<PathBuf>,
    /// Override uploads root directory.
    pub uploads_root: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "cms.toml";

/// Default uploads root, relative to the config directory.
const DEFAULT_UPLOADS_ROOT: &str = "static/cms/uploads";

/// Default URL path uploads are served under.
const DEFAULT_UPLOADS_URL_PATH: &str = "/static/cms/uploads";

/// Default database filename, relative to the config directory.
const DEFAULT_DATABASE_PATH: &str = "cms.sqlite3";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration (paths are relative strings from TOML).
    database: DatabaseConfigRaw,
    /// Uploads configuration (paths are relative strings from TOML).
    uploads: UploadsConfigRaw,
    /// Analytics configuration.
    pub analytics: AnalyticsConfig,

    /// Resolved database configuration (set after loading).
    #[serde(skip)]
    pub database_resolved: DatabaseConfig,
    /// Resolved uploads configuration (set after loading).
    #[serde(skip)]
    pub uploads_resolved: UploadsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// Raw database configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DatabaseConfigRaw {
    path: Option<String>,
}

/// Resolved database configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

/// Raw uploads configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UploadsConfigRaw {
    root: Option<String>,
    url_path: Option<String>,
    subdirectories: BTreeMap<String, String>,
}

/// Resolved uploads configuration.
#[derive(Debug, Default)]
pub struct UploadsConfig {
    /// Directory uploaded static files are stored under.
    pub root: PathBuf,
    /// URL path the uploads root is served under (e.g. `/static/cms/uploads`).
    pub url_path: String,
    /// Extension-to-subdirectory overrides, merged over the built-in table.
    ///
    /// Keys include the leading dot (`.svg`). An empty value disables
    /// routing for that extension.
    pub subdirectories: BTreeMap<String, String>,
}

/// Analytics configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Tracking identifier rendered into every page (empty disables tracking).
    pub code: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`analytics.code`").
        field: String,
        /// Error message (e.g., "${`GA_CODE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `cms.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged
    /// configuration is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(database) = &settings.database {
            self.database_resolved.path.clone_from(database);
        }
        if let Some(uploads_root) = &settings.uploads_root {
            self.uploads_resolved.root.clone_from(uploads_root);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfigRaw::default(),
            uploads: UploadsConfigRaw::default(),
            analytics: AnalyticsConfig::default(),
            database_resolved: DatabaseConfig {
                path: base.join(DEFAULT_DATABASE_PATH),
            },
            uploads_resolved: UploadsConfig {
                root: base.join(DEFAULT_UPLOADS_ROOT),
                url_path: DEFAULT_UPLOADS_URL_PATH.to_owned(),
                subdirectories: BTreeMap::new(),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_uploads()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate uploads configuration.
    fn validate_uploads(&self) -> Result<(), ConfigError> {
        let uploads = &self.uploads_resolved;

        if !uploads.url_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "uploads.url_path must start with /".to_owned(),
            ));
        }
        if uploads.url_path.ends_with('/') {
            return Err(ConfigError::Validation(
                "uploads.url_path must not be / or end with /".to_owned(),
            ));
        }

        for (extension, subdir) in &uploads.subdirectories {
            if extension.len() < 2 || !extension.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "uploads.subdirectories key {extension:?} must be an extension like \".png\""
                )));
            }
            let single_component = matches!(
                Path::new(subdir).components().collect::<Vec<_>>().as_slice(),
                [] | [Component::Normal(_)]
            );
            if !single_component {
                return Err(ConfigError::Validation(format!(
                    "uploads.subdirectories.{extension:?} must be a single directory name, got {subdir:?}"
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.analytics.code = expand::expand_env(&self.analytics.code, "analytics.code")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.database_resolved = DatabaseConfig {
            path: resolve(self.database.path.as_deref(), DEFAULT_DATABASE_PATH),
        };

        self.uploads_resolved = UploadsConfig {
            root: resolve(self.uploads.root.as_deref(), DEFAULT_UPLOADS_ROOT),
            url_path: self
                .uploads
                .url_path
                .clone()
                .unwrap_or_else(|| DEFAULT_UPLOADS_URL_PATH.to_owned()),
            subdirectories: self.uploads.subdirectories.clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.database_resolved.path,
            PathBuf::from("/test/cms.sqlite3")
        );
        assert_eq!(
            config.uploads_resolved.root,
            PathBuf::from("/test/static/cms/uploads")
        );
        assert_eq!(config.uploads_resolved.url_path, "/static/cms/uploads");
        assert!(config.uploads_resolved.subdirectories.is_empty());
        assert_eq!(config.analytics.code, "");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_analytics_config() {
        let toml = r#"
[analytics]
code = "UA-12345-1"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.analytics.code, "UA-12345-1");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[database]
path = "data/site.db"

[uploads]
root = "public/uploads"
url_path = "/media"

[uploads.subdirectories]
".svg" = "images"
".txt" = ""
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.database_resolved.path,
            PathBuf::from("/project/data/site.db")
        );
        assert_eq!(
            config.uploads_resolved.root,
            PathBuf::from("/project/public/uploads")
        );
        assert_eq!(config.uploads_resolved.url_path, "/media");
        assert_eq!(
            config.uploads_resolved.subdirectories,
            BTreeMap::from([
                (".svg".to_owned(), "images".to_owned()),
                (".txt".to_owned(), String::new()),
            ])
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[server]
port = 8123

[analytics]
code = "G-ABC"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 8123);
        assert_eq!(config.analytics.code, "G-ABC");
        assert_eq!(config.database_resolved.path, dir.path().join("cms.sqlite3"));
        assert_eq!(
            config.uploads_resolved.root,
            dir.path().join("static/cms/uploads")
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/cms.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_validates_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();
        let overrides = CliSettings {
            port: Some(0),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_apply_cli_settings_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_paths() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            database: Some(PathBuf::from("/data/cms.db")),
            uploads_root: Some(PathBuf::from("/srv/uploads")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.database_resolved.path, PathBuf::from("/data/cms.db"));
        assert_eq!(config.uploads_resolved.root, PathBuf::from("/srv/uploads"));
        assert_eq!(config.uploads_resolved.url_path, "/static/cms/uploads"); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let config_before = Config::default_with_base(Path::new("/test"));
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.server.host, config_before.server.host);
        assert_eq!(config.server.port, config_before.server.port);
        assert_eq!(
            config.database_resolved.path,
            config_before.database_resolved.path
        );
    }

    #[test]
    fn test_expand_env_vars_analytics_code() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TEST_CMS_GA_CODE", "G-XYZ");
        }

        let toml = r#"
[analytics]
code = "${TEST_CMS_GA_CODE}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.analytics.code, "G-XYZ");

        unsafe {
            std::env::remove_var("TEST_CMS_GA_CODE");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MISSING_VAR_CMS_CONFIG_TEST");
        }

        let toml = r#"
[server]
host = "${MISSING_VAR_CMS_CONFIG_TEST}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MISSING_VAR_CMS_CONFIG_TEST"));
        assert!(err.to_string().contains("server.host"));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_uploads_url_path_relative() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.uploads_resolved.url_path = "static/cms".to_owned();
        assert_validation_error(&config, &["uploads.url_path", "start with /"]);
    }

    #[test]
    fn test_validate_uploads_url_path_trailing_slash() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.uploads_resolved.url_path = "/static/cms/".to_owned();
        assert_validation_error(&config, &["uploads.url_path", "end with /"]);
    }

    #[test]
    fn test_validate_uploads_url_path_root() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.uploads_resolved.url_path = "/".to_owned();
        assert_validation_error(&config, &["uploads.url_path"]);
    }

    #[test]
    fn test_validate_subdirectory_key_without_dot() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .uploads_resolved
            .subdirectories
            .insert("svg".to_owned(), "images".to_owned());
        assert_validation_error(&config, &["svg", "extension"]);
    }

    #[test]
    fn test_validate_subdirectory_value_nested() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .uploads_resolved
            .subdirectories
            .insert(".svg".to_owned(), "../images".to_owned());
        assert_validation_error(&config, &["single directory name"]);
    }

    #[test]
    fn test_validate_subdirectory_empty_value_allowed() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config
            .uploads_resolved
            .subdirectories
            .insert(".pdf".to_owned(), String::new());
        assert!(config.validate().is_ok());
    }
}
