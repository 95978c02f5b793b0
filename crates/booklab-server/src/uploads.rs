use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::{
    config::{RemoteHostConfig, UploadStrategy, UploadsConfig},
    error::{CatalogError, CatalogResult},
};

/// An uploaded cover image: raw bytes plus the browser-supplied filename,
/// kept only for its extension.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Turns an uploaded file into a durable reference string for
/// `BookRecord.image`. Implementations must not depend on request-scoped
/// state; the reference has to stay fetchable after the request ends.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(&self, upload: UploadedFile) -> CatalogResult<String>;
}

/// Persists files under a server-managed directory and answers with a
/// site-relative path served by the static mount.
pub struct LocalAttachmentStore {
    dir: PathBuf,
    public_prefix: String,
}

impl LocalAttachmentStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str) -> CatalogResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| CatalogError::Upload(err.to_string()))?;
        if !public_prefix.starts_with('/') {
            return Err(CatalogError::Configuration(format!(
                "public prefix must start with '/': {public_prefix}"
            )));
        }
        Ok(Self {
            dir,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AttachmentResolver for LocalAttachmentStore {
    async fn resolve(&self, upload: UploadedFile) -> CatalogResult<String> {
        let name = stored_name(&upload.filename);
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|err| CatalogError::Upload(err.to_string()))?;
        Ok(format!("{}/{}", self.public_prefix, name))
    }
}

/// Uploads bytes to an external asset host and answers with the permanent
/// URL the host returns.
pub struct RemoteAttachmentStore {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    folder: String,
}

impl RemoteAttachmentStore {
    pub fn new(config: &RemoteHostConfig) -> CatalogResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| CatalogError::Configuration(format!("asset host endpoint: {err}")))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| CatalogError::Configuration(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            folder: config.folder.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AssetHostResponse {
    url: String,
}

#[async_trait]
impl AttachmentResolver for RemoteAttachmentStore {
    async fn resolve(&self, upload: UploadedFile) -> CatalogResult<String> {
        let part = reqwest::multipart::Part::bytes(upload.bytes.to_vec())
            .file_name(upload.filename.clone());
        let form = reqwest::multipart::Form::new()
            .text("folder", self.folder.clone())
            .part("file", part);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", self.api_key.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|err| CatalogError::Upload(err.to_string()))?;
        if !response.status().is_success() {
            return Err(CatalogError::Upload(format!(
                "asset host returned {}",
                response.status()
            )));
        }
        let body: AssetHostResponse = response
            .json()
            .await
            .map_err(|err| CatalogError::Upload(err.to_string()))?;
        Ok(body.url)
    }
}

/// Builds the resolver the configuration asks for. Selection happens once
/// at process start; callers hold only the trait object.
pub fn from_config(
    uploads: &UploadsConfig,
    data_dir: &Path,
) -> CatalogResult<Arc<dyn AttachmentResolver>> {
    match uploads.strategy {
        UploadStrategy::Local => {
            let dir = uploads
                .local_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("uploads"));
            Ok(Arc::new(LocalAttachmentStore::new(
                dir,
                &uploads.public_prefix,
            )?))
        }
        UploadStrategy::Remote => {
            let remote = uploads.remote.as_ref().ok_or_else(|| {
                CatalogError::Configuration(
                    "remote upload strategy requires an asset host section".to_string(),
                )
            })?;
            Ok(Arc::new(RemoteAttachmentStore::new(remote)?))
        }
    }
}

fn stored_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{}{}", Uuid::new_v4(), ext)
}
