//! TOML configuration for the relay daemon.
//!
//! Every field has a default, so a partial file (or no file at all)
//! still yields a runnable configuration.

use std::net::AddrParseError;
use std::path::Path;

use serde::{Deserialize, Serialize};

use prism_core::{Colormap, FrameGeometry, JpegEncoder, RelayServerConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub network: NetworkConfig,
    pub image: ImageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bind address for the producer endpoint.
    pub producer_addr: String,
    pub producer_port: u16,
    /// Bind address for the viewer endpoint. Loopback by default; the
    /// visualization client runs on the same host.
    pub viewer_addr: String,
    pub viewer_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            producer_addr: "0.0.0.0".to_string(),
            producer_port: 8002,
            viewer_addr: "127.0.0.1".to_string(),
            viewer_port: 8001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    /// JPEG quality, clamped into 1..=100.
    pub jpeg_quality: u8,
    /// Colormap in force at startup. Unknown names mean inferno.
    pub default_colormap: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            jpeg_quality: JpegEncoder::DEFAULT_QUALITY,
            default_colormap: "inferno".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// Load from `path`, falling back to defaults when the file is
    /// missing or malformed. Runs before the tracing subscriber is
    /// installed, so diagnostics go straight to stderr.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!(
                        "config file {} is invalid ({e}), using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("config file {} not found, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the default configuration to `path` for bootstrapping.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Resolve into the server's runtime configuration.
    pub fn to_server_config(&self) -> Result<RelayServerConfig, AddrParseError> {
        let producer = format!(
            "{}:{}",
            self.network.producer_addr, self.network.producer_port
        );
        let viewer = format!("{}:{}", self.network.viewer_addr, self.network.viewer_port);
        Ok(RelayServerConfig {
            producer_addr: producer.parse()?,
            viewer_addr: viewer.parse()?,
            geometry: FrameGeometry::new(self.image.width, self.image.height),
            jpeg_quality: self.image.jpeg_quality.clamp(1, 100),
            default_colormap: Colormap::resolve(&self.image.default_colormap),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&RelayConfig::default()).unwrap();
        assert!(text.contains("producer_port"));
        assert!(text.contains("jpeg_quality"));
        assert!(text.contains("default_colormap"));
    }

    #[test]
    fn roundtrip_config() {
        let config = RelayConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: RelayConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.network.producer_port, 8002);
        assert_eq!(parsed.network.viewer_port, 8001);
        assert_eq!(parsed.image.jpeg_quality, 85);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: RelayConfig = toml::from_str("[network]\nproducer_port = 9000\n").unwrap();
        assert_eq!(parsed.network.producer_port, 9000);
        assert_eq!(parsed.network.producer_addr, "0.0.0.0");
        assert_eq!(parsed.image.width, 960);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn to_server_config_resolves_and_clamps() {
        let mut config = RelayConfig::default();
        config.image.jpeg_quality = 0;
        config.image.default_colormap = "sunset".to_string();

        let server = config.to_server_config().unwrap();
        assert_eq!(server.jpeg_quality, 1);
        assert_eq!(server.default_colormap, Colormap::Inferno);
        assert_eq!(server.producer_addr.port(), 8002);
        assert!(server.viewer_addr.ip().is_loopback());
    }

    #[test]
    fn to_server_config_rejects_bad_addresses() {
        let mut config = RelayConfig::default();
        config.network.viewer_addr = "not-an-ip".to_string();
        assert!(config.to_server_config().is_err());
    }
}
