pub mod api;
pub mod session;
pub mod view;

pub use api::{
    Attachment, BookPatch, BookRecord, CatalogApi, ClientError, SessionGrant, UserProfile,
};
pub use session::{Route, RouteGuard, SessionError, SessionStore};
pub use view::{BookDraft, CatalogView, Surface};
