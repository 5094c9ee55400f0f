use crate::upload::MAX_UPLOAD_BYTES;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Proxy configuration, loaded from CLI, environment, or a TOML config file
///
/// Example configuration file content
/// # Genre Proxy Configuration
///
/// listen_on_port = 5000
/// workspace = "./data"
/// static_dir = "./build"
///
/// # External model endpoint (optional, fallback labels are used when unset)
/// model_api_url = "https://model.example.com/predict"
/// model_timeout_secs = 120
///
/// # Require X-API-KEY on /api/predict (optional)
/// api_key = "secret"
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Working directory for transient uploads
    #[arg(short = 'w', long, default_value = ".")]
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// External model endpoint the uploads are forwarded to
    #[arg(short, long, env = "MODEL_API_URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_api_url: Option<String>,

    /// Timeout for calls to the external model endpoint, in seconds
    #[arg(long, default_value_t = 120)]
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// When set, /api/predict requires a matching X-API-KEY header
    #[arg(long, env = "API_TOKEN")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Pre-built client bundle, served with an index.html fallback when present
    #[arg(short, long, default_value = "build")]
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Maximum accepted request body size in bytes
    #[arg(long, default_value_t = 32 * 1024 * 1024)]
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Configuration file path (overrides default-valued arguments)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_on_port: default_port(),
            workspace: default_workspace(),
            model_api_url: None,
            model_timeout_secs: default_model_timeout_secs(),
            api_key: None,
            static_dir: default_static_dir(),
            max_body_bytes: default_max_body_bytes(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        let config = config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        // If CLI value is default, use file value
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.workspace == default_workspace() {
            self.workspace = file_config.workspace;
        }
        if self.model_timeout_secs == default_model_timeout_secs() {
            self.model_timeout_secs = file_config.model_timeout_secs;
        }
        if self.static_dir == default_static_dir() {
            self.static_dir = file_config.static_dir;
        }
        if self.max_body_bytes == default_max_body_bytes() {
            self.max_body_bytes = file_config.max_body_bytes;
        }

        // For Option fields, CLI takes precedence if Some
        if self.model_api_url.is_none() {
            self.model_api_url = file_config.model_api_url;
        }
        if self.api_key.is_none() {
            self.api_key = file_config.api_key;
        }

        self
    }

    /// An empty `MODEL_API_URL=` or `API_TOKEN=` means "not configured"
    pub fn normalize(mut self) -> Self {
        self.model_api_url = self
            .model_api_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self.api_key = self.api_key.filter(|key| !key.is_empty());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.model_api_url
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "Model API URL must start with http:// or https://"
            ));
        }

        if self.model_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Model timeout must be greater than zero"));
        }

        if (self.max_body_bytes as u64) < MAX_UPLOAD_BYTES {
            return Err(anyhow::anyhow!(
                "max_body_bytes must be at least {MAX_UPLOAD_BYTES} so every accepted upload fits"
            ));
        }

        Ok(())
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn workspace_path(&self) -> PathBuf {
        PathBuf::from(&self.workspace)
    }

    pub fn static_path(&self) -> PathBuf {
        PathBuf::from(&self.static_dir)
    }
}

// Default value functions
fn default_port() -> u16 {
    5000
}

fn default_workspace() -> String {
    ".".to_string()
}

fn default_model_timeout_secs() -> u64 {
    120
}

fn default_static_dir() -> String {
    "build".to_string()
}

fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_from_cli() {
        let cli_content = [
            "CLI",
            "--listen-on-port",
            "8080",
            "--workspace",
            "/tmp/test",
            "--model-api-url",
            "http://127.0.0.1:9000/predict",
            "--model-timeout-secs",
            "30",
            "--api-key",
            "secret",
        ];

        let config = Config::try_parse_from(cli_content).unwrap();

        assert_eq!(config.listen_on_port, 8080);
        assert_eq!(config.workspace, "/tmp/test");
        assert_eq!(
            config.model_api_url.as_deref(),
            Some("http://127.0.0.1:9000/predict")
        );
        assert_eq!(config.model_timeout(), Duration::from_secs(30));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.static_dir, "build");
    }

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            listen_on_port = 8080
            workspace = "/tmp/test"
            model_api_url = "https://model.example.com/predict"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.listen_on_port, 8080);
        assert_eq!(
            config.model_api_url.as_deref(),
            Some("https://model.example.com/predict")
        );
        // Unset fields keep their defaults
        assert_eq!(config.model_timeout_secs, 120);
        assert_eq!(config.max_body_bytes, 32 * 1024 * 1024);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_merge_prefers_cli() {
        let file_config = Config {
            listen_on_port: 7000,
            model_api_url: Some("http://file/predict".into()),
            api_key: Some("from-file".into()),
            ..Default::default()
        };

        let cli_config = Config {
            listen_on_port: 9000,
            api_key: Some("from-cli".into()),
            ..Default::default()
        };

        let merged = cli_config.merge_with_file(file_config);

        assert_eq!(merged.listen_on_port, 9000); // CLI value takes precedence
        assert_eq!(merged.model_api_url.as_deref(), Some("http://file/predict"));
        assert_eq!(merged.api_key.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_empty_values_mean_unconfigured() {
        let config = Config {
            model_api_url: Some("  ".into()),
            api_key: Some(String::new()),
            ..Default::default()
        }
        .normalize();

        assert!(config.model_api_url.is_none());
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_model_url() {
        let config = Config {
            model_api_url: Some("ftp://model".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_small_body_limit() {
        let config = Config {
            max_body_bytes: 1024,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            model_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
