//! Configuration loading for kvsession.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Explicit config file passed by the embedding application
//! 3. User config (`~/.kvsession/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. A store built from `Config::default()`
//! uses a single in-memory node, one-hour retention and 32-byte identifiers.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::BackendMode;
use crate::error::{Result, SessionError};
use crate::session::{DEFAULT_ID_BYTES, MIN_ID_BYTES};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Session lifetime configuration.
    pub session: SessionConfig,
    /// Identifier generation configuration.
    pub generator: GeneratorConfig,
    /// Backend deployment configuration.
    pub backend: BackendConfig,
}

/// Session lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session record lives before the backend discards it.
    pub retention_secs: u64,
}

/// Minimum valid retention (the backend rejects a zero TTL).
pub const MIN_RETENTION_SECS: u64 = 1;

impl SessionConfig {
    pub fn is_valid_retention(value: u64) -> bool {
        value >= MIN_RETENTION_SECS
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
        }
    }
}

/// Identifier generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Length of generated identifiers in bytes.
    pub id_bytes: usize,
}

impl GeneratorConfig {
    pub fn is_valid_id_bytes(value: usize) -> bool {
        value >= MIN_ID_BYTES
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            id_bytes: DEFAULT_ID_BYTES,
        }
    }
}

/// Backend deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Deployment mode.
    pub mode: BackendMode,
    /// Number of shards when `mode` is `cluster`.
    pub shards: u32,
}

/// Minimum valid shard count.
pub const MIN_SHARDS: u32 = 1;

impl BackendConfig {
    pub fn is_valid_shards(value: u32) -> bool {
        value >= MIN_SHARDS
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Single,
            shards: 3,
        }
    }
}

/// One config file as written: only the fields it actually sets.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigLayer {
    session: Option<SessionLayer>,
    generator: Option<GeneratorLayer>,
    backend: Option<BackendLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SessionLayer {
    retention_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GeneratorLayer {
    id_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BackendLayer {
    mode: Option<BackendMode>,
    shards: Option<u32>,
}

impl ConfigLayer {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SessionError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| SessionError::config(e.to_string()))
    }
}

impl Config {
    /// Load configuration from the user config and the environment.
    ///
    /// A user config that cannot be read, parsed or validated is skipped
    /// with a warning.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(layer) = Self::load_user_layer() {
            config = config.apply(layer);
        }

        config.apply_env_overrides();
        config
    }

    /// Load configuration layering an explicit file over the user config.
    ///
    /// Unlike the user config, an explicit file that cannot be read or
    /// parsed is an error, and so is an invalid result.
    pub fn load_with_file(path: &Path) -> Result<Self> {
        let mut config = Config::default();

        if let Some(layer) = Self::load_user_layer() {
            config = config.apply(layer);
        }

        config = config.apply(ConfigLayer::read(path)?);
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load the user layer from `<kvsession_home>/config.toml`.
    fn load_user_layer() -> Option<ConfigLayer> {
        let path = kvsession_home()?.join("config.toml");
        if !path.exists() {
            return None;
        }
        let layer = match ConfigLayer::read(&path) {
            Ok(layer) => layer,
            Err(err) => {
                tracing::warn!("ignoring user config {}: {}", path.display(), err);
                return None;
            }
        };
        if let Err(err) = Config::default().apply(layer.clone()).validate() {
            tracing::warn!("ignoring user config {}: {}", path.display(), err);
            return None;
        }
        Some(layer)
    }

    /// Load config from a specific file path. Unset fields take defaults.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Ok(Config::default().apply(ConfigLayer::read(path)?))
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SessionError::config(e.to_string()))
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if !SessionConfig::is_valid_retention(self.session.retention_secs) {
            return Err(SessionError::config(format!(
                "session.retention_secs must be >= {}",
                MIN_RETENTION_SECS
            )));
        }
        if !GeneratorConfig::is_valid_id_bytes(self.generator.id_bytes) {
            return Err(SessionError::config(format!(
                "generator.id_bytes must be >= {}",
                MIN_ID_BYTES
            )));
        }
        if !BackendConfig::is_valid_shards(self.backend.shards) {
            return Err(SessionError::config(format!(
                "backend.shards must be >= {}",
                MIN_SHARDS
            )));
        }
        Ok(())
    }

    /// Retention as a `Duration`.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.session.retention_secs)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // KVSESSION_RETENTION_SECS
        if let Ok(val) = env::var("KVSESSION_RETENTION_SECS") {
            match val.parse::<u64>() {
                Ok(n) if SessionConfig::is_valid_retention(n) => self.session.retention_secs = n,
                _ => tracing::warn!(
                    "Invalid KVSESSION_RETENTION_SECS value '{}'. \
                    Expected an integer >= {}. Using '{}'.",
                    val,
                    MIN_RETENTION_SECS,
                    self.session.retention_secs
                ),
            }
        }

        // KVSESSION_ID_BYTES
        if let Ok(val) = env::var("KVSESSION_ID_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if GeneratorConfig::is_valid_id_bytes(n) => self.generator.id_bytes = n,
                _ => tracing::warn!(
                    "Invalid KVSESSION_ID_BYTES value '{}'. \
                    Expected an integer >= {}. Using '{}'.",
                    val,
                    MIN_ID_BYTES,
                    self.generator.id_bytes
                ),
            }
        }

        // KVSESSION_BACKEND_MODE
        if let Ok(val) = env::var("KVSESSION_BACKEND_MODE") {
            match BackendMode::parse(&val) {
                Some(mode) => self.backend.mode = mode,
                None => tracing::warn!(
                    "Invalid KVSESSION_BACKEND_MODE value '{}'. \
                    Valid values: single, cluster. Using '{}'.",
                    val,
                    self.backend.mode
                ),
            }
        }

        // KVSESSION_SHARDS
        if let Ok(val) = env::var("KVSESSION_SHARDS") {
            match val.parse::<u32>() {
                Ok(n) if BackendConfig::is_valid_shards(n) => self.backend.shards = n,
                _ => tracing::warn!(
                    "Invalid KVSESSION_SHARDS value '{}'. \
                    Expected an integer >= {}. Using '{}'.",
                    val,
                    MIN_SHARDS,
                    self.backend.shards
                ),
            }
        }
    }

    /// Overlay a file layer: every field the layer sets wins, even when it
    /// equals the default.
    fn apply(mut self, layer: ConfigLayer) -> Self {
        if let Some(session) = layer.session {
            if let Some(retention_secs) = session.retention_secs {
                self.session.retention_secs = retention_secs;
            }
        }

        if let Some(generator) = layer.generator {
            if let Some(id_bytes) = generator.id_bytes {
                self.generator.id_bytes = id_bytes;
            }
        }

        if let Some(backend) = layer.backend {
            if let Some(mode) = backend.mode {
                self.backend.mode = mode;
            }
            if let Some(shards) = backend.shards {
                self.backend.shards = shards;
            }
        }

        self
    }
}

/// Get the kvsession home directory.
///
/// Checks `KVSESSION_HOME` first, then falls back to `~/.kvsession`.
/// An empty `KVSESSION_HOME` is ignored.
pub fn kvsession_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("KVSESSION_HOME") {
        if home.is_empty() {
            tracing::warn!("KVSESSION_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    dirs::home_dir().map(|home| home.join(".kvsession"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "KVSESSION_HOME",
        "KVSESSION_RETENTION_SECS",
        "KVSESSION_ID_BYTES",
        "KVSESSION_BACKEND_MODE",
        "KVSESSION_SHARDS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    fn layer(text: &str) -> ConfigLayer {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.session.retention_secs, 3600);
        assert_eq!(config.retention(), Duration::from_secs(3600));
        assert_eq!(config.generator.id_bytes, 32);
        assert_eq!(config.backend.mode, BackendMode::Single);
        assert_eq!(config.backend.shards, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[session]
retention_secs = 900

[backend]
mode = "cluster"
shards = 6
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.session.retention_secs, 900);
        assert_eq!(config.backend.mode, BackendMode::Cluster);
        assert_eq!(config.backend.shards, 6);
        // Other fields should be defaults
        assert_eq!(config.generator.id_bytes, 32);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(SessionError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(SessionError::Config { .. })));
    }

    #[test]
    fn test_unknown_backend_mode_rejected() {
        let result = Config::from_toml_str("[backend]\nmode = \"replicated\"\n");
        assert!(matches!(result, Err(SessionError::Config { .. })));
    }

    #[test]
    fn test_backend_mode_aliases() {
        let config = Config::from_toml_str("[backend]\nmode = \"sharded\"\n").unwrap();
        assert_eq!(config.backend.mode, BackendMode::Cluster);
        let config = Config::from_toml_str("[backend]\nmode = \"standalone\"\n").unwrap();
        assert_eq!(config.backend.mode, BackendMode::Single);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.session.retention_secs = 60;
        config.backend.mode = BackendMode::Cluster;

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("mode = \"cluster\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[generator]\nid_bytes = 48\n").unwrap();
        assert_eq!(config.generator.id_bytes, 48);
        assert_eq!(config.session.retention_secs, 3600);
        assert_eq!(config.backend.mode, BackendMode::Single);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.session.retention_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generator.id_bytes = 8;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.shards = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut base = Config::default();
        base.session.retention_secs = 60;

        let applied = base.apply(layer("[backend]\nshards = 5\n"));
        assert_eq!(applied.session.retention_secs, 60);
        assert_eq!(applied.backend.shards, 5);
        assert_eq!(applied.backend.mode, BackendMode::Single);
    }

    #[test]
    fn test_apply_default_valued_field_still_wins() {
        let mut base = Config::default();
        base.session.retention_secs = 100;
        base.backend.mode = BackendMode::Cluster;

        let applied = base.apply(layer(
            "[session]\nretention_secs = 3600\n[backend]\nmode = \"single\"\n",
        ));
        assert_eq!(applied.session.retention_secs, 3600);
        assert_eq!(applied.backend.mode, BackendMode::Single);
    }

    #[test]
    #[serial]
    fn test_user_config_and_explicit_file_precedence() {
        clear_env();
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[session]\nretention_secs = 100\n[backend]\nshards = 7\n",
        )
        .unwrap();
        env::set_var("KVSESSION_HOME", home.path());

        let explicit = home.path().join("app.toml");
        fs::write(&explicit, "[session]\nretention_secs = 200\n").unwrap();

        let config = Config::load_with_file(&explicit).unwrap();
        // Explicit file wins over user config
        assert_eq!(config.session.retention_secs, 200);
        // User config still applies where the explicit file is silent
        assert_eq!(config.backend.shards, 7);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_file_can_restore_default_value() {
        clear_env();
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[session]\nretention_secs = 100\n",
        )
        .unwrap();
        env::set_var("KVSESSION_HOME", home.path());

        let explicit = home.path().join("app.toml");
        fs::write(&explicit, "[session]\nretention_secs = 3600\n").unwrap();

        let config = Config::load_with_file(&explicit).unwrap();
        assert_eq!(config.session.retention_secs, 3600);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_user_config_is_skipped() {
        clear_env();
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), "not toml [[[").unwrap();
        env::set_var("KVSESSION_HOME", home.path());

        let config = Config::load();
        assert_eq!(config, Config::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_out_of_range_user_config_is_skipped() {
        clear_env();
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[session]\nretention_secs = 0\n[backend]\nshards = 7\n",
        )
        .unwrap();
        env::set_var("KVSESSION_HOME", home.path());

        let config = Config::load();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_explicit_file_must_be_valid() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("KVSESSION_HOME", home.path());

        let explicit = home.path().join("app.toml");
        fs::write(&explicit, "[generator]\nid_bytes = 4\n").unwrap();
        assert!(Config::load_with_file(&explicit).is_err());
        assert!(Config::load_with_file(&home.path().join("missing.toml")).is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("KVSESSION_HOME", home.path());
        env::set_var("KVSESSION_RETENTION_SECS", "30");
        env::set_var("KVSESSION_ID_BYTES", "64");
        env::set_var("KVSESSION_BACKEND_MODE", "cluster");
        env::set_var("KVSESSION_SHARDS", "9");

        let config = Config::load();

        assert_eq!(config.session.retention_secs, 30);
        assert_eq!(config.generator.id_bytes, 64);
        assert_eq!(config.backend.mode, BackendMode::Cluster);
        assert_eq!(config.backend.shards, 9);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_precedence_over_file() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("KVSESSION_HOME", home.path());
        let explicit = home.path().join("app.toml");
        fs::write(&explicit, "[session]\nretention_secs = 200\n").unwrap();
        env::set_var("KVSESSION_RETENTION_SECS", "15");

        let config = Config::load_with_file(&explicit).unwrap();
        assert_eq!(config.session.retention_secs, 15);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_ignored() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("KVSESSION_HOME", home.path());
        env::set_var("KVSESSION_RETENTION_SECS", "0");
        env::set_var("KVSESSION_ID_BYTES", "lots");
        env::set_var("KVSESSION_BACKEND_MODE", "replicated");
        env::set_var("KVSESSION_SHARDS", "0");

        let config = Config::load();
        assert_eq!(config, Config::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_kvsession_home_with_env() {
        clear_env();
        env::set_var("KVSESSION_HOME", "/custom/kvsession");
        assert_eq!(kvsession_home(), Some(PathBuf::from("/custom/kvsession")));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_kvsession_home_empty_env() {
        clear_env();
        env::set_var("KVSESSION_HOME", "");
        let home = kvsession_home();
        if let Some(path) = home {
            assert!(path.ends_with(".kvsession"));
        }
        clear_env();
    }
}
