//! Configuration for the fixture, the auditor and the assertion policy
//!
//! Loaded from a JSON file so a CI job can point the harness at a different
//! static root or add base allow-list entries without recompiling. Every
//! field has a default; a missing or malformed file falls back to them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file read by [`HarnessConfig::load`].
pub const CONFIG_ENV: &str = "AUDIT_HARNESS_CONFIG";

/// Complete harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub fixture: FixtureConfig,
    pub auditor: AuditorConfig,
    pub policy: PolicyConfig,
}

/// Test server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Listen address; port 0 picks a free port
    pub bind_addr: SocketAddr,
    /// Directory served under `/static`
    pub static_root: PathBuf,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            static_root: PathBuf::from("."),
        }
    }
}

impl FixtureConfig {
    pub fn with_static_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.static_root = root.into();
        self
    }
}

/// Auditor run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditorConfig {
    /// User-Agent sent when the caller doesn't supply one
    pub user_agent: String,
    /// Issue a conditional follow-up request when the response has validators
    pub validate_conditionals: bool,
    /// Upper bound on buffered response body size
    pub max_body_bytes: usize,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("audit_harness/", env!("CARGO_PKG_VERSION")).to_string(),
            validate_conditionals: true,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Assertion policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Locale used when rendering message text into logs
    pub locale: String,
    /// Warning kinds added to the always-allowed base set
    pub extra_allowed_warnings: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            locale: crate::message::catalog::DEFAULT_LOCALE.to_string(),
            extra_allowed_warnings: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from JSON file
    ///
    /// # Returns
    /// * The parsed configuration, or defaults when the file doesn't exist or
    ///   isn't valid JSON (logged as a warning)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `$AUDIT_HARNESS_CONFIG`, else `audit_harness.json`
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "audit_harness.json".to_string());
        Self::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.fixture.bind_addr.port(), 0);
        assert_eq!(config.fixture.static_root, PathBuf::from("."));
        assert!(config.auditor.validate_conditionals);
        assert!(config.auditor.user_agent.starts_with("audit_harness/"));
        assert_eq!(config.policy.locale, "en");
        assert!(config.policy.extra_allowed_warnings.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"policy": {{"extra_allowed_warnings": ["CT_MISSING"]}}}}"#
        )
        .unwrap();

        let config = HarnessConfig::load_from_file(file.path());
        assert_eq!(config.policy.extra_allowed_warnings, vec!["CT_MISSING"]);
        assert_eq!(config.policy.locale, "en");
        assert_eq!(config.auditor.max_body_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = HarnessConfig::load_from_file(file.path());
        assert!(config.auditor.validate_conditionals);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = HarnessConfig::load_from_file("/definitely/not/here.json");
        assert_eq!(config.fixture.bind_addr.port(), 0);
    }
}
