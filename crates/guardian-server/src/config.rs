//! Server configuration.
//!
//! Built in three layers, later layers winning: built-in defaults, an
//! optional TOML file, then environment variables / command-line flags.
//! The governance key is only ever taken from the last layer; a TOML file
//! that names it is rejected.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use guardian_contracts::error::{GuardianError, GuardianResult};
use guardian_schema::DEFAULT_SCHEMA_PATH;

pub const DEFAULT_AUDIT_LOG_PATH: &str = "audit_events.jsonl";
pub const DEFAULT_CONSTITUTION_VERSION: &str = "v0.2";
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));

/// Everything the server needs to start.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(skip)]
    pub governance_key: Option<String>,
    pub audit_log_path: PathBuf,
    pub constitution_version: String,
    pub schema_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            governance_key: None,
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            constitution_version: DEFAULT_CONSTITUTION_VERSION.to_string(),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            bind_addr: DEFAULT_BIND_ADDR,
        }
    }
}

/// Values supplied by the environment or command line.  `None` leaves the
/// underlying layer untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub governance_key: Option<String>,
    pub audit_log_path: Option<PathBuf>,
    pub constitution_version: Option<String>,
    pub schema_path: Option<PathBuf>,
    pub bind_addr: Option<SocketAddr>,
}

impl ServerConfig {
    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(s: &str) -> GuardianResult<Self> {
        toml::from_str(s).map_err(|e| GuardianError::Configuration {
            reason: format!("failed to parse server config TOML: {}", e),
        })
    }

    pub fn from_file(path: &Path) -> GuardianResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GuardianError::Configuration {
            reason: format!("failed to read server config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply the top layer.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(key) = overrides.governance_key {
            self.governance_key = Some(key);
        }
        if let Some(path) = overrides.audit_log_path {
            self.audit_log_path = path;
        }
        if let Some(version) = overrides.constitution_version {
            self.constitution_version = version;
        }
        if let Some(path) = overrides.schema_path {
            self.schema_path = path;
        }
        if let Some(addr) = overrides.bind_addr {
            self.bind_addr = addr;
        }
        self
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field(
                "governance_key",
                &self.governance_key.as_ref().map(|_| "<redacted>"),
            )
            .field("audit_log_path", &self.audit_log_path)
            .field("constitution_version", &self.constitution_version)
            .field("schema_path", &self.schema_path)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use guardian_contracts::error::GuardianError;

    use super::{ConfigOverrides, ServerConfig};

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert!(config.governance_key.is_none());
        assert_eq!(config.audit_log_path, PathBuf::from("audit_events.jsonl"));
        assert_eq!(config.constitution_version, "v0.2");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.schema_path, PathBuf::from("governance/HARM_OVERRIDE_EVENT_SCHEMA.json"));
    }

    #[test]
    fn toml_overrides_defaults_field_by_field() {
        let config = ServerConfig::from_toml_str(
            r#"
            audit_log_path = "/var/lib/guardian/audit.jsonl"
            constitution_version = "v1.0"
            "#,
        )
        .unwrap();

        assert_eq!(config.audit_log_path, PathBuf::from("/var/lib/guardian/audit.jsonl"));
        assert_eq!(config.constitution_version, "v1.0");
        assert_eq!(config.schema_path, ServerConfig::default().schema_path);
    }

    #[test]
    fn governance_key_in_toml_is_rejected() {
        let result = ServerConfig::from_toml_str(r#"governance_key = "oops""#);
        assert!(matches!(result, Err(GuardianError::Configuration { .. })));
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        let result = ServerConfig::from_toml_str(r#"bind_addr = "not an address""#);
        assert!(matches!(result, Err(GuardianError::Configuration { .. })));
    }

    #[test]
    fn overrides_win() {
        let config = ServerConfig::from_toml_str(r#"constitution_version = "v1.0""#)
            .unwrap()
            .with_overrides(ConfigOverrides {
                governance_key: Some("key".to_string()),
                constitution_version: Some("v2".to_string()),
                ..ConfigOverrides::default()
            });

        assert_eq!(config.constitution_version, "v2");
        assert_eq!(config.governance_key.as_deref(), Some("key"));
        assert_eq!(config.audit_log_path, PathBuf::from("audit_events.jsonl"));
    }

    #[test]
    fn debug_redacts_governance_key() {
        let config = ServerConfig::default().with_overrides(ConfigOverrides {
            governance_key: Some("top-secret".to_string()),
            ..ConfigOverrides::default()
        });
        assert!(!format!("{:?}", config).contains("top-secret"));
    }
}
