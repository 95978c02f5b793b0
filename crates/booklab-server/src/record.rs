use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A catalog entry. `image` holds either a site-relative path under the
/// static mount or an absolute URL on the remote asset host.
#[derive(Debug, Clone, Serialize, Deserialize)]
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

impl BookRecord {
    pub fn new(submission: BookSubmission, image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: submission.title,
            author: submission.author,
            publisher: submission.publisher,
            published_date: submission.published_date,
            pages: submission.pages,
            description: submission.description,
            image,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The create payload. Every field is required and non-empty; the image
/// travels separately as a file part.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookSubmission {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "publisher is required"))]
    pub publisher: String,
    #[validate(length(min = 1, message = "publishedDate is required"))]
    pub published_date: String,
    #[validate(length(min = 1, message = "pages is required"))]
    pub pages: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
}

/// Partial update: present fields overwrite, absent fields keep their
/// prior values. `image` is set only when a new file accompanied the
/// request; there is no way to clear an image through a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub pages: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl BookPatch {
    pub fn apply(self, record: &mut BookRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(author) = self.author {
            record.author = author;
        }
        if let Some(publisher) = self.publisher {
            record.publisher = publisher;
        }
        if let Some(published_date) = self.published_date {
            record.published_date = published_date;
        }
        if let Some(pages) = self.pages {
            record.pages = pages;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(image) = self.image {
            record.image = Some(image);
        }
        record.updated_at = Utc::now();
    }

    /// Treat the patch as a full create payload, with absent fields
    /// becoming empty strings that fail validation.
    pub fn into_submission(self) -> BookSubmission {
        BookSubmission {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            published_date: self.published_date.unwrap_or_default(),
            pages: self.pages.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        }
    }
}
