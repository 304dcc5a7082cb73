use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/api.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub profile_store: ProfileStoreConfig,
    pub correlation: EngineConfig,
    pub detection: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub base_dir: PathBuf,
    pub model_weights: PathBuf,
    pub data_source: PathBuf,
    /// Where uploads are staged; the system temp dir when unset.
    pub upload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileStoreConfig {
    Unavailable,
    File { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineConfig {
    #[default]
    Unavailable,
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            profile_store: ProfileStoreConfig::default(),
            correlation: EngineConfig::default(),
            detection: EngineConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:8501".to_string(),
                "http://127.0.0.1:8501".to_string(),
            ],
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            model_weights: PathBuf::from("detection/best.pt"),
            data_source: PathBuf::from("acne_tracker.db"),
            upload_dir: None,
        }
    }
}

impl Default for ProfileStoreConfig {
    fn default() -> Self {
        ProfileStoreConfig::File {
            path: PathBuf::from("profiles.json"),
        }
    }
}

impl AppConfig {
    /// Loads `$API_CONFIG` (or `config/api.yaml`), applies environment
    /// overrides and resolves every relative path against `paths.base_dir`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("API_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            log::info!("Loading configuration from {}", config_path.display());
            Self::from_yaml_file(&config_path)?
        } else {
            log::info!(
                "No config file at {}, using built-in defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config.resolved())
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port,
            })?;
        }
        if let Some(base_dir) = lookup("BASE_DIR") {
            self.paths.base_dir = PathBuf::from(base_dir);
        }
        if let Some(model) = lookup("MODEL_WEIGHTS_PATH") {
            self.paths.model_weights = PathBuf::from(model);
        }
        if let Some(data_source) = lookup("DATA_SOURCE_PATH") {
            self.paths.data_source = PathBuf::from(data_source);
        }
        if let Some(upload_dir) = lookup("UPLOAD_DIR") {
            self.paths.upload_dir = Some(PathBuf::from(upload_dir));
        }
        Ok(())
    }

    pub fn resolved(mut self) -> Self {
        let base = self.paths.base_dir.clone();
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        };

        self.paths.model_weights = resolve(&self.paths.model_weights);
        self.paths.data_source = resolve(&self.paths.data_source);
        self.paths.upload_dir = self.paths.upload_dir.as_deref().map(|p| resolve(p));
        if let ProfileStoreConfig::File { path } = &mut self.profile_store {
            *path = resolve(path);
        }
        self
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.paths
            .upload_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
