//! Oracle configuration loading and management.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Full configuration for the verification oracle.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OracleConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Pinned issuing-authority certificates.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Witness signing key.
    #[serde(default)]
    pub issuer: IssuerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Largest accepted multipart body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrustConfig {
    /// Certificate files (PEM, base64 or DER). Empty means the embedded
    /// issuing-authority certificate.
    #[serde(default)]
    pub anchor_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IssuerConfig {
    /// File holding a hex Ed25519 seed. Absent means a fresh key per start.
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    3000
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_api_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl OracleConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: OracleConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.api.listen_addr, self.api.port);
        Ok(addr.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OracleConfig::default();
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.logging.format, "text");
        assert!(config.trust.anchor_paths.is_empty());
        assert!(config.issuer.key_path.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let config = OracleConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_load_nonexistent_uses_defaults() {
        let config = OracleConfig::load(Path::new("/nonexistent/oracle.toml")).unwrap();
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("oracle.toml");

        let mut config = OracleConfig::default();
        config.api.port = 4100;
        config.trust.anchor_paths = vec![PathBuf::from("certs/uidai.cer")];
        config.save(&path).unwrap();

        let loaded = OracleConfig::load(&path).unwrap();
        assert_eq!(loaded.api.port, 4100);
        assert_eq!(loaded.trust.anchor_paths, vec![PathBuf::from("certs/uidai.cer")]);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
[api]
port = 8080

[logging]
format = "json"
"#;
        let config: OracleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.listen_addr, "0.0.0.0");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }
}
