use std::path::PathBuf;

use dirs::home_dir;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookLabConfig {
    pub data_dir: PathBuf,
    pub rest: RestConfig,
    pub uploads: UploadsConfig,
    pub security: SecurityConfig,
}

impl BookLabConfig {
    pub fn load(path: Option<PathBuf>) -> CatalogResult<Self> {
        let mut settings = config::Config::builder();
        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path));
        } else if let Some(home) = home_dir() {
            let default = home.join(".booklab").join("booklab-config.yaml");
            if default.exists() {
                settings = settings.add_source(config::File::from(default));
            }
        }
        settings =
            settings.add_source(config::Environment::with_prefix("BOOKLAB").separator("__"));
        let cfg = settings
            .build()
            .map_err(|err| CatalogError::Configuration(err.to_string()))?;
        cfg.try_deserialize()
            .map_err(|err| CatalogError::Configuration(err.to_string()))
    }

    pub fn ensure_dirs(&self) -> CatalogResult<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|err| CatalogError::Configuration(err.to_string()))
    }

    /// Directory the local upload strategy writes into.
    pub fn upload_dir(&self) -> PathBuf {
        self.uploads
            .local_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }
}

impl Default for BookLabConfig {
    fn default() -> Self {
        let data_dir = home_dir()
            .map(|dir| dir.join(".booklab").join("data"))
            .unwrap_or_else(|| PathBuf::from("./data"));
        Self {
            data_dir,
            rest: RestConfig::default(),
            uploads: UploadsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub bind_addr: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            cors_allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub strategy: UploadStrategy,
    /// Defaults to `<data_dir>/uploads` when unset.
    pub local_dir: Option<PathBuf>,
    pub public_prefix: String,
    pub remote: Option<RemoteHostConfig>,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            strategy: UploadStrategy::Local,
            local_dir: None,
            public_prefix: "/uploads".to_string(),
            remote: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStrategy {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteHostConfig {
    pub endpoint: String,
    pub api_key: String,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: std::env::var("BOOKLAB_SECRET")
                .unwrap_or_else(|_| "change-me-super-secret".to_string()),
            jwt_issuer: "booklab.api".to_string(),
            jwt_audience: "booklab.clients".to_string(),
            jwt_expiry_minutes: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_local_strategy() {
        let cfg = BookLabConfig::default();
        assert_eq!(cfg.uploads.strategy, UploadStrategy::Local);
        assert_eq!(cfg.uploads.public_prefix, "/uploads");
        assert!(cfg.uploads.remote.is_none());
    }

    #[test]
    fn upload_dir_falls_back_under_data_dir() {
        let cfg = BookLabConfig {
            data_dir: PathBuf::from("/tmp/booklab"),
            ..BookLabConfig::default()
        };
        assert_eq!(cfg.upload_dir(), PathBuf::from("/tmp/booklab/uploads"));

        let pinned = BookLabConfig {
            uploads: UploadsConfig {
                local_dir: Some(PathBuf::from("/srv/assets")),
                ..UploadsConfig::default()
            },
            ..BookLabConfig::default()
        };
        assert_eq!(pinned.upload_dir(), PathBuf::from("/srv/assets"));
    }
}
