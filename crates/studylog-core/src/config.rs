//! Configuration resolution for studylog.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`$XDG_CONFIG_HOME/studylog/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (`STUDYLOG_*`)
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete studylog configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub certificates: CertificateConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    /// Base URL printed on certificates, e.g. `https://target.saas`.
    pub public_base_url: String,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: None,
            public_base_url: "http://localhost:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Certificate issuance policy and document branding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Brand line printed at the top of every certificate.
    pub brand_name: String,
    /// Floor on logged hours, applied on top of each plan's own target.
    pub minimum_hours: f64,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            brand_name: "TARGET SaaS".to_string(),
            minimum_hours: 1.0,
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 3600,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }
    }

    let global = global_config_path().filter(|p| p.exists());
    let mut config = load_layered(global.as_deref(), explicit)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("studylog").join("settings.json"))
}

/// Default database location when none is configured.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("studylog").join("studylog.db"))
}

/// Merge the config files key by key, later files winning, then fill
/// whatever no file set from the built-in defaults.
fn load_layered(global: Option<&Path>, explicit: Option<&Path>) -> Result<Config> {
    let mut merged = Value::Object(Map::new());
    for path in [global, explicit].into_iter().flatten() {
        merge_values(&mut merged, read_json(path)?);
    }
    serde_json::from_value(merged).map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Overlay `overlay` onto `base`. Objects merge recursively; any other value
/// replaces what was there.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = var("STUDYLOG_LISTEN_ADDR") {
        config.server.listen_addr = val
            .parse()
            .map_err(|e| Error::Config(format!("STUDYLOG_LISTEN_ADDR: {e}")))?;
    }
    if let Some(val) = var("STUDYLOG_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("STUDYLOG_PUBLIC_BASE_URL") {
        config.server.public_base_url = val;
    }
    if let Some(val) = var("STUDYLOG_LOG_LEVEL") {
        config.server.log_level = val;
    }
    if let Some(val) = var("STUDYLOG_BRAND_NAME") {
        config.certificates.brand_name = val;
    }
    if let Some(val) = var("STUDYLOG_MINIMUM_HOURS") {
        config.certificates.minimum_hours = val
            .parse()
            .map_err(|e| Error::Config(format!("STUDYLOG_MINIMUM_HOURS: {e}")))?;
    }
    if let Some(val) = var("STUDYLOG_ACCESS_TTL_SECS") {
        config.auth.access_ttl_secs = val
            .parse()
            .map_err(|e| Error::Config(format!("STUDYLOG_ACCESS_TTL_SECS: {e}")))?;
    }
    Ok(())
}

/// Reject settings the server cannot run with.
pub fn validate(config: &Config) -> Result<()> {
    let min = config.certificates.minimum_hours;
    if !min.is_finite() || min < 0.0 {
        return Err(Error::Config(format!(
            "certificates.minimum_hours must be a non-negative number, got {min}"
        )));
    }
    if config.auth.access_ttl_secs <= 0 {
        return Err(Error::Config("auth.access_ttl_secs must be positive".into()));
    }
    let url = &config.server.public_base_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "server.public_base_url must be an http(s) URL, got {url:?}"
        )));
    }
    Ok(())
}
