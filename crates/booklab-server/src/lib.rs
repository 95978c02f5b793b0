pub mod auth;
pub mod config;
pub mod error;
pub mod record;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod uploads;

pub use auth::{JwtSigner, UserAccount};
pub use config::{BookLabConfig, UploadStrategy};
pub use error::{CatalogError, CatalogResult};
pub use record::{BookPatch, BookRecord, BookSubmission};
pub use server::BookLabServer;
pub use store::RecordStore;
pub use telemetry::{CatalogEvent, TelemetryHub};
pub use uploads::{
    AttachmentResolver, LocalAttachmentStore, RemoteAttachmentStore, UploadedFile,
};
