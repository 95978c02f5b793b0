use std::path::Path;

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view::BookDraft;

/// Wire mirror of the server's book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub pages: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update: only present fields travel in the request. A new
/// cover image is passed separately as an [`Attachment`].
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub pages: Option<String>,
    pub description: Option<String>,
}

impl BookPatch {
    fn field_entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        let pairs = [
            ("title", &self.title),
            ("author", &self.author),
            ("publisher", &self.publisher),
            ("publishedDate", &self.published_date),
            ("pages", &self.pages),
            ("description", &self.description),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                entries.push((name, value.clone()));
            }
        }
        entries
    }
}

/// A cover image picked for upload.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self { filename, bytes })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct DeleteReceipt {
    message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    BaseUrl(String),
    /// Any non-2xx answer; `message` is the server's wording when the
    /// response carried one, a generic fallback otherwise.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        ClientError::Transport(value.to_string())
    }
}

pub struct CatalogApi {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_books(&self) -> Result<Vec<BookRecord>, ClientError> {
        let response = self.client.get(self.endpoint("/api/books")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn create_book(
        &self,
        draft: &BookDraft,
        attachment: Option<Attachment>,
    ) -> Result<BookRecord, ClientError> {
        let form = book_form(draft.field_entries(), attachment);
        let response = self
            .client
            .post(self.endpoint("/api/books"))
            .multipart(form)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn update_book(
        &self,
        id: &str,
        patch: &BookPatch,
        attachment: Option<Attachment>,
    ) -> Result<BookRecord, ClientError> {
        let form = book_form(patch.field_entries(), attachment);
        let response = self
            .client
            .put(self.endpoint(&format!("/api/books/{id}")))
            .multipart(form)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn delete_book(&self, id: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/api/books/{id}")))
            .send()
            .await?;
        let receipt: DeleteReceipt = ensure_success(response).await?.json().await?;
        Ok(receipt.message)
    }

    /// Fetches cover bytes for the preview surface. Site-relative
    /// references resolve against the API host; absolute URLs are used
    /// as-is.
    pub async fn fetch_asset(&self, reference: &str) -> Result<Vec<u8>, ClientError> {
        let url = if reference.starts_with('/') {
            self.endpoint(reference)
        } else {
            reference.to_string()
        };
        let response = self.client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/api/auth/register"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/api/auth/login"))
            .json(&Credentials { email, password })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}

fn book_form(entries: Vec<(&'static str, String)>, attachment: Option<Attachment>) -> Form {
    let mut form = Form::new();
    for (name, value) in entries {
        form = form.text(name, value);
    }
    if let Some(attachment) = attachment {
        let part = Part::bytes(attachment.bytes).file_name(attachment.filename);
        form = form.part("image", part);
    }
    form
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| "request failed".to_string());
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_must_be_http() {
        assert!(matches!(
            CatalogApi::new("ftp://books.example"),
            Err(ClientError::BaseUrl(_))
        ));
        let api = CatalogApi::new("http://localhost:5000/").expect("api");
        assert_eq!(api.endpoint("/api/books"), "http://localhost:5000/api/books");
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = BookPatch {
            title: Some("Dune Messiah".to_string()),
            pages: Some("331".to_string()),
            ..BookPatch::default()
        };
        let entries = patch.field_entries();
        assert_eq!(
            entries,
            vec![
                ("title", "Dune Messiah".to_string()),
                ("pages", "331".to_string()),
            ]
        );
    }
}
