//! # Configuration
//!
//! `LocusConfig` is assembled in three layers, later layers winning:
//!
//! 1. Optional TOML file (`--config locus.toml`)
//! 2. `LOCUS_*` environment variables
//! 3. CLI flags
//!
//! ```toml
//! [store]
//! path = "maps/aisle.db"
//!
//! [engine]
//! program = "rtabmap-console"
//! timeout_secs = 60
//!
//! [navigation]
//! invert_y = true
//! yaw_origin_deg = 0.0
//!
//! [server]
//! port = 8080
//! rate_limit = 100
//! ```

use locus_core::LocusError;
use locus_core::guidance::AxisConvention;
use locus_core::primitives::DEFAULT_MAX_PREFILTER_FRAMES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default decoded image limit: 10 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Default engine wall-clock budget.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 60;

/// Default requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SECTIONS
// =============================================================================

/// `[store]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite map store produced by the mapping pipeline.
    pub path: PathBuf,
    /// Cap on frames scored per search.
    pub max_prefilter_frames: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.db"),
            max_prefilter_frames: DEFAULT_MAX_PREFILTER_FRAMES,
        }
    }
}

/// `[engine]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recognition engine executable.
    pub program: PathBuf,
    pub timeout_secs: u64,
    /// Parent directory of per-request workspaces. System temp dir if unset.
    pub workspace_root: Option<PathBuf>,
    /// `--Key value` pairs appended after the fixed profile.
    pub extra_params: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rtabmap-console"),
            timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            workspace_root: None,
            extra_params: Vec::new(),
        }
    }
}

/// `[navigation]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub invert_y: bool,
    pub yaw_origin_deg: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let axis = AxisConvention::rtabmap();
        Self {
            invert_y: axis.invert_y,
            yaw_origin_deg: axis.yaw_origin_deg,
        }
    }
}

impl NavigationConfig {
    #[must_use]
    pub const fn axis(&self) -> AxisConvention {
        AxisConvention {
            invert_y: self.invert_y,
            yaw_origin_deg: self.yaw_origin_deg,
        }
    }
}

/// `[server]`
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bearer key required on every route but `/health`.
    pub api_key: Option<String>,
    /// `*` or a comma-separated origin list. Localhost only if unset.
    pub cors_origins: Option<String>,
    pub max_image_bytes: usize,
    /// Images used by `POST /localize`.
    pub test_image_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: DEFAULT_RATE_LIMIT,
            api_key: None,
            cors_origins: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            test_image_dir: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rate_limit", &self.rate_limit)
            .field(
                "api_key",
                if self.api_key.is_some() { &"<redacted>" } else { &"<not set>" },
            )
            .field("cors_origins", &self.cors_origins)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("test_image_dir", &self.test_image_dir)
            .finish()
    }
}

// =============================================================================
// LOCUS CONFIG
// =============================================================================

/// Full service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocusConfig {
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub navigation: NavigationConfig,
    pub server: ServerConfig,
}

impl LocusConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, LocusError> {
        toml::from_str(text).map_err(|e| LocusError::Config(format!("invalid TOML: {}", e)))
    }

    /// Load from `path` if given, else defaults; then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, LocusError> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| {
                    LocusError::Config(format!("cannot read {}: {}", p.display(), e))
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `LOCUS_*` overrides read through `lookup`.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `LOCUS_DATABASE` | `store.path` |
    /// | `LOCUS_ENGINE` | `engine.program` |
    /// | `LOCUS_RATE_LIMIT` | `server.rate_limit` |
    /// | `LOCUS_API_KEY` | `server.api_key` (empty disables) |
    /// | `LOCUS_CORS_ORIGINS` | `server.cors_origins` |
    /// | `LOCUS_TEST_IMAGE_DIR` | `server.test_image_dir` |
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOCUS_DATABASE") {
            self.store.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOCUS_ENGINE") {
            self.engine.program = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOCUS_RATE_LIMIT") {
            match v.parse::<u32>() {
                Ok(rps) => self.server.rate_limit = rps,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid LOCUS_RATE_LIMIT"),
            }
        }
        if let Some(v) = lookup("LOCUS_API_KEY") {
            self.server.api_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = lookup("LOCUS_CORS_ORIGINS") {
            self.server.cors_origins = Some(v);
        }
        if let Some(v) = lookup("LOCUS_TEST_IMAGE_DIR") {
            self.server.test_image_dir = Some(PathBuf::from(v));
        }
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), LocusError> {
        if self.engine.timeout_secs == 0 {
            return Err(LocusError::Config("engine.timeout_secs must be > 0".into()));
        }
        if self.store.max_prefilter_frames == 0 {
            return Err(LocusError::Config(
                "store.max_prefilter_frames must be > 0".into(),
            ));
        }
        if self.server.max_image_bytes == 0 {
            return Err(LocusError::Config("server.max_image_bytes must be > 0".into()));
        }
        if !self.navigation.yaw_origin_deg.is_finite() {
            return Err(LocusError::Config(
                "navigation.yaw_origin_deg must be finite".into(),
            ));
        }
        validate_extra_params(&self.engine.extra_params)
    }
}

/// Extra engine params come in `--Group/Name value` pairs.
fn validate_extra_params(params: &[String]) -> Result<(), LocusError> {
    if params.len() % 2 != 0 {
        return Err(LocusError::Config(
            "engine.extra_params must be --Key value pairs".into(),
        ));
    }
    for pair in params.chunks(2) {
        let (key, value) = (&pair[0], &pair[1]);
        let well_formed = key
            .strip_prefix("--")
            .is_some_and(|k| k.contains('/') && !k.contains(char::is_whitespace));
        if !well_formed {
            return Err(LocusError::Config(format!(
                "engine.extra_params key '{}' is not of the form --Group/Name",
                key
            )));
        }
        if value.starts_with("--") {
            return Err(LocusError::Config(format!(
                "engine.extra_params key '{}' has no value",
                key
            )));
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = LocusConfig::default();
        assert_eq!(config.engine.timeout_secs, 60);
        assert_eq!(config.engine.program, PathBuf::from("rtabmap-console"));
        assert_eq!(config.store.max_prefilter_frames, 50);
        assert_eq!(config.server.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.navigation.axis(), AxisConvention::rtabmap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = LocusConfig::from_toml(
            r#"
            [store]
            path = "maps/aisle.db"

            [navigation]
            yaw_origin_deg = 90.0
            "#,
        )
        .expect("parse");
        assert_eq!(config.store.path, PathBuf::from("maps/aisle.db"));
        assert_eq!(config.store.max_prefilter_frames, 50);
        assert_eq!(config.navigation.axis(), AxisConvention::forward_negative_y());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = LocusConfig::from_toml("[store\npath=").expect_err("invalid");
        assert!(matches!(err, LocusError::Config(_)));
    }

    #[test]
    fn env_overrides() {
        let mut config = LocusConfig::default();
        config.apply_env(env(&[
            ("LOCUS_DATABASE", "/srv/map.db"),
            ("LOCUS_RATE_LIMIT", "0"),
            ("LOCUS_API_KEY", "secret"),
            ("LOCUS_TEST_IMAGE_DIR", "/srv/images"),
        ]));
        assert_eq!(config.store.path, PathBuf::from("/srv/map.db"));
        assert_eq!(config.server.rate_limit, 0);
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert_eq!(config.server.test_image_dir, Some(PathBuf::from("/srv/images")));
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let mut config = LocusConfig::default();
        config.server.api_key = Some("from-file".into());
        config.apply_env(env(&[("LOCUS_API_KEY", "")]));
        assert!(config.server.api_key.is_none());
    }

    #[test]
    fn invalid_rate_limit_is_ignored() {
        let mut config = LocusConfig::default();
        config.apply_env(env(&[("LOCUS_RATE_LIMIT", "fast")]));
        assert_eq!(config.server.rate_limit, DEFAULT_RATE_LIMIT);
    }

    #[test]
    fn validation() {
        let mut config = LocusConfig::default();
        config.engine.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = LocusConfig::default();
        config.engine.extra_params = vec!["--Vis/MinInliers".into(), "20".into()];
        assert!(config.validate().is_ok());

        config.engine.extra_params = vec!["--Vis/MinInliers".into()];
        assert!(config.validate().is_err());

        config.engine.extra_params = vec!["MinInliers".into(), "20".into()];
        assert!(config.validate().is_err());

        config.engine.extra_params = vec!["--Vis/MinInliers".into(), "--Kp/MaxFeatures".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = ServerConfig::default();
        config.api_key = Some("hunter2".into());
        let text = format!("{:?}", config);
        assert!(!text.contains("hunter2"));
        assert!(text.contains("<redacted>"));
    }
}
