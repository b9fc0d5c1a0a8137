//! Configuration management for plantgen.
//!
//! Parses `plantgen.toml` with serde and discovers it in the current
//! directory or its parents. Relative paths resolve against the directory of
//! the config file. CLI settings are applied on top via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `input.path`
//! - `server.url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "plantgen.toml";

/// Public `PlantUML` server.
const DEFAULT_SERVER_URL: &str = "https://www.plantuml.com/plantuml";

/// Accepted output formats.
const FORMATS: [&str; 2] = ["svg", "png"];

/// Per-request timeout when `server.timeout_secs` is not set.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound for `server.timeout_secs`.
const MAX_TIMEOUT_SECS: u64 = 600;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override input document.
    pub input: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override render server URL.
    pub server_url: Option<String>,
    /// Override output format.
    pub format: Option<String>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input document and record schema (paths are relative strings from TOML).
    input: InputConfigRaw,
    /// Render server configuration.
    pub server: ServerConfig,
    /// Output layout (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Render cache (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Source decoration.
    pub theme: ThemeConfig,

    /// Resolved input configuration (set after loading).
    #[serde(skip)]
    pub input_resolved: InputConfig,
    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw input configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InputConfigRaw {
    path: Option<String>,
    record: Option<String>,
    id_field: Option<String>,
    section_field: Option<String>,
    diagram_field: Option<String>,
    diagram_list_field: Option<String>,
}

/// Resolved input configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfig {
    /// Source document to extract from.
    pub path: PathBuf,
    /// Record type name following `new`.
    pub record: String,
    pub id_field: String,
    pub section_field: String,
    /// Single-diagram field; `None` when set to `""`.
    pub diagram_field: Option<String>,
    /// Diagram list field; `None` when set to `""`.
    pub diagram_list_field: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Level.cs"),
            record: "Level".to_owned(),
            id_field: "Id".to_owned(),
            section_field: "Section".to_owned(),
            diagram_field: Some("PlantUMLSource".to_owned()),
            diagram_list_field: Some("PlantUMLSources".to_owned()),
        }
    }
}

/// Render server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server base URL; the encoded diagram goes after `/{format}/`.
    pub url: String,
    /// Output format (`svg` or `png`).
    pub format: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_owned(),
            format: "svg".to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Raw output configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
    section_prefix: Option<String>,
    section_prefix_replacement: Option<String>,
}

/// Resolved output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputConfig {
    /// Root directory for rendered images.
    pub dir: PathBuf,
    /// Leading section word to replace in folder names (empty: none).
    pub section_prefix: String,
    pub section_prefix_replacement: String,
}

/// When the cache file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushMode {
    /// After every successful render.
    #[default]
    Each,
    /// Once at the end of the run.
    End,
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    path: Option<String>,
    flush: Option<FlushMode>,
}

/// Resolved cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache file location.
    pub path: PathBuf,
    pub flush: FlushMode,
}

/// Source decoration settings.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ThemeConfig {
    /// Lines inserted after the diagram start marker.
    pub directives: Vec<String>,
    /// Leading member markers that get a trailing space.
    pub pad_markers: Vec<String>,
    /// Inline markers of members rendered underlined.
    pub underline_markers: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            directives: vec![
                "!theme blueprint".to_owned(),
                "skinparam backgroundcolor transparent".to_owned(),
            ],
            pad_markers: vec!["-".to_owned(), "+".to_owned(), "#".to_owned()],
            underline_markers: vec!["{static}".to_owned(), "<<key>>".to_owned()],
        }
    }
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
        /// Config field path (e.g., "`server.url`").
        field: String,
        /// Error message (e.g., "${`PLANTUML_HOST`} not set").
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

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Treat an empty field name as "not used".
fn optional_field(value: Option<String>, default: Option<String>) -> Option<String> {
    match value {
        Some(v) if v.is_empty() => None,
        Some(v) => Some(v),
        None => default,
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `plantgen.toml` in the current directory and its parents, and falls
    /// back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after path resolution and take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the final configuration is invalid.
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
        if let Some(input) = &settings.input {
            self.input_resolved.path.clone_from(input);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.dir.clone_from(output_dir);
        }
        if let Some(server_url) = &settings.server_url {
            self.server.url.clone_from(server_url);
        }
        if let Some(format) = &settings.format {
            self.server.format.clone_from(format);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
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
        let mut config = Self {
            input: InputConfigRaw::default(),
            server: ServerConfig::default(),
            output: OutputConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            theme: ThemeConfig::default(),
            input_resolved: InputConfig::default(),
            output_resolved: OutputConfig::default(),
            cache_resolved: CacheConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
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
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_input()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.url, "server.url")?;
        require_http_url(&self.server.url, "server.url")?;

        if !FORMATS.contains(&self.server.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "server.format must be one of {}, got \"{}\"",
                FORMATS.join(", "),
                self.server.format
            )));
        }

        if self.server.timeout_secs == 0 || self.server.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "server.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    fn validate_input(&self) -> Result<(), ConfigError> {
        let input = &self.input_resolved;
        require_non_empty(&input.record, "input.record")?;
        require_non_empty(&input.id_field, "input.id_field")?;
        require_non_empty(&input.section_field, "input.section_field")?;

        if input.diagram_field.is_none() && input.diagram_list_field.is_none() {
            return Err(ConfigError::Validation(
                "input requires diagram_field or diagram_list_field".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.url = expand::expand_env(&self.server.url, "server.url")?;

        if let Some(ref path) = self.input.path {
            self.input.path = Some(expand::expand_env(path, "input.path")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory and fill in
    /// defaults for absent values.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let defaults = InputConfig::default();

        self.input_resolved = InputConfig {
            path: resolve(self.input.path.as_deref(), "Level.cs"),
            record: self.input.record.clone().unwrap_or(defaults.record),
            id_field: self.input.id_field.clone().unwrap_or(defaults.id_field),
            section_field: self
                .input
                .section_field
                .clone()
                .unwrap_or(defaults.section_field),
            diagram_field: optional_field(self.input.diagram_field.clone(), defaults.diagram_field),
            diagram_list_field: optional_field(
                self.input.diagram_list_field.clone(),
                defaults.diagram_list_field,
            ),
        };

        self.output_resolved = OutputConfig {
            dir: resolve(self.output.dir.as_deref(), "assets/img"),
            section_prefix: self.output.section_prefix.clone().unwrap_or_default(),
            section_prefix_replacement: self
                .output
                .section_prefix_replacement
                .clone()
                .unwrap_or_default(),
        };

        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            path: resolve(self.cache.path.as_deref(), "plantuml_cache.json"),
            flush: self.cache.flush.unwrap_or_default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.url, "https://www.plantuml.com/plantuml");
        assert_eq!(config.server.format, "svg");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.input_resolved.path, PathBuf::from("/test/Level.cs"));
        assert_eq!(config.input_resolved.record, "Level");
        assert_eq!(config.output_resolved.dir, PathBuf::from("/test/assets/img"));
        assert_eq!(
            config.cache_resolved.path,
            PathBuf::from("/test/plantuml_cache.json")
        );
        assert!(config.cache_resolved.enabled);
        assert_eq!(config.cache_resolved.flush, FlushMode::Each);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.url, DEFAULT_SERVER_URL);
        assert_eq!(config.theme, ThemeConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[input]
path = "cs/SqlLevel.cs"
record = "SqlLevel"
diagram_field = ""

[server]
url = "http://localhost:8080/plantuml"
format = "png"
timeout_secs = 10

[output]
dir = "img"
section_prefix = "Sektion "
section_prefix_replacement = "sec"

[cache]
enabled = false
path = ".cache/plantuml.json"
flush = "end"

[theme]
directives = ["skinparam backgroundcolor transparent"]
pad_markers = ["-", "+"]
underline_markers = ["{static}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.input_resolved,
            InputConfig {
                path: PathBuf::from("/project/cs/SqlLevel.cs"),
                record: "SqlLevel".to_owned(),
                id_field: "Id".to_owned(),
                section_field: "Section".to_owned(),
                diagram_field: None,
                diagram_list_field: Some("PlantUMLSources".to_owned()),
            }
        );
        assert_eq!(config.server.format, "png");
        assert_eq!(config.server.timeout_secs, 10);
        assert_eq!(config.output_resolved.dir, PathBuf::from("/project/img"));
        assert_eq!(config.output_resolved.section_prefix, "Sektion ");
        assert_eq!(config.output_resolved.section_prefix_replacement, "sec");
        assert!(!config.cache_resolved.enabled);
        assert_eq!(
            config.cache_resolved.path,
            PathBuf::from("/project/.cache/plantuml.json")
        );
        assert_eq!(config.cache_resolved.flush, FlushMode::End);
        assert_eq!(config.theme.pad_markers, vec!["-".to_owned(), "+".to_owned()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_flush_mode_is_parse_error() {
        let result: Result<Config, _> = toml::from_str("[cache]\nflush = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.url = "ftp://example.com".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("server.url"));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.url = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.format = "jpg".to_owned();
        assert!(config.validate().unwrap_err().to_string().contains("server.format"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.server.timeout_secs = 601;
        assert!(config.validate().is_err());
        config.server.timeout_secs = 600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_a_diagram_field() {
        let toml = r#"
[input]
diagram_field = ""
diagram_list_field = ""
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("diagram_field"));
    }

    #[test]
    fn test_validate_requires_record_keyword() {
        let mut config: Config = toml::from_str("[input]\nrecord = \"\"\n").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert!(config.validate().unwrap_err().to_string().contains("input.record"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            input: Some(PathBuf::from("other/Level.cs")),
            server_url: Some("http://localhost:8080".to_owned()),
            cache_enabled: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.input_resolved.path, PathBuf::from("other/Level.cs"));
        assert_eq!(config.server.url, "http://localhost:8080");
        assert!(!config.cache_resolved.enabled);
        // Unchanged
        assert_eq!(config.server.format, "svg");
        assert_eq!(config.output_resolved.dir, PathBuf::from("/test/assets/img"));
    }

    #[test]
    fn test_apply_cli_settings_format_and_output() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            output_dir: Some(PathBuf::from("/out")),
            format: Some("png".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.output_resolved.dir, PathBuf::from("/out"));
        assert_eq!(config.server.format, "png");
    }

    #[test]
    fn test_load_explicit_path_not_found() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("plantgen.toml");

        let err = Config::load(Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_resolves_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[input]
path = "cs/Level.cs"

[output]
dir = "assets/img"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.input_resolved.path, tmp.path().join("cs/Level.cs"));
        assert_eq!(config.output_resolved.dir, tmp.path().join("assets/img"));
        assert_eq!(
            config.cache_resolved.path,
            tmp.path().join("plantuml_cache.json")
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_validates_after_cli_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        let overrides = CliSettings {
            format: Some("gif".to_owned()),
            ..Default::default()
        };
        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server\nurl = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_expands_server_url() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[server]\nurl = \"${PLANTGEN_TEST_CONFIG_URL:-http://localhost:8080/plantuml}\"\n",
        )
        .unwrap();
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("PLANTGEN_TEST_CONFIG_URL");
        }

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.server.url, "http://localhost:8080/plantuml");
    }

    #[test]
    fn test_load_missing_env_var() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[input]\npath = \"${PLANTGEN_TEST_NO_SUCH_VAR}\"\n").unwrap();
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("PLANTGEN_TEST_NO_SUCH_VAR");
        }

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "input.path"));
    }
}
