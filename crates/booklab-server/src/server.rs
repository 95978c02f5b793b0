use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    auth::{self, JwtSigner, UserAccount},
    config::{BookLabConfig, UploadStrategy},
    error::{CatalogError, CatalogResult},
    record::{BookPatch, BookRecord},
    store::RecordStore,
    telemetry::{CatalogEvent, TelemetryHub},
    uploads::{self, AttachmentResolver, UploadedFile},
};

pub struct BookLabServer {
    config: BookLabConfig,
    state: ApiState,
}

#[derive(Clone)]
pub struct ApiState {
    store: Arc<RecordStore>,
    attachments: Arc<dyn AttachmentResolver>,
    signer: JwtSigner,
    telemetry: TelemetryHub,
}

impl BookLabServer {
    pub fn new(config: BookLabConfig) -> CatalogResult<Self> {
        let store = Arc::new(RecordStore::new(&config)?);
        let attachments = uploads::from_config(&config.uploads, &config.data_dir)?;
        let signer = JwtSigner::new(&config.security);
        let telemetry = TelemetryHub::new(1024);
        Ok(Self {
            config,
            state: ApiState {
                store,
                attachments,
                signer,
                telemetry,
            },
        })
    }

    pub fn router(&self) -> CatalogResult<Router> {
        let static_mount = match self.config.uploads.strategy {
            UploadStrategy::Local => Some((
                self.config.uploads.public_prefix.clone(),
                self.config.upload_dir(),
            )),
            UploadStrategy::Remote => None,
        };
        build_router(
            self.state.clone(),
            static_mount,
            &self.config.rest.cors_allowed_origins,
        )
    }

    pub async fn run(self) -> CatalogResult<()> {
        let addr: SocketAddr = self
            .config
            .rest
            .bind_addr
            .parse()
            .map_err(|err: std::net::AddrParseError| {
                CatalogError::Configuration(err.to_string())
            })?;
        let app = self.router()?;
        info!(?addr, "BookLab API listening");
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| CatalogError::Internal(err.to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|err| CatalogError::Internal(err.to_string()))
    }
}

pub fn build_router(
    state: ApiState,
    static_mount: Option<(String, PathBuf)>,
    cors_origins: &[String],
) -> CatalogResult<Router> {
    let mut app = Router::new()
        .route("/", get(root))
        .route("/api/books", get(list_books).post(create_book))
        .route("/api/books/:id", put(update_book).delete(delete_book))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .with_state(state);
    if let Some((prefix, dir)) = static_mount {
        app = app.nest_service(&prefix, ServeDir::new(dir));
    }
    Ok(app
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(origins: &[String]) -> CatalogResult<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        allowed.push(origin.parse::<HeaderValue>().map_err(|err| {
            CatalogError::Configuration(format!("cors origin {origin}: {err}"))
        })?);
    }
    Ok(CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn root() -> &'static str {
    "BookLab API Running"
}

async fn list_books(State(state): State<ApiState>) -> Result<Json<Vec<BookRecord>>, ApiError> {
    Ok(Json(state.store.list_books()?))
}

async fn create_book(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BookRecord>), ApiError> {
    let BookForm { fields, upload } = read_book_form(multipart).await?;
    let submission = fields.into_submission();
    submission.validate().map_err(CatalogError::from)?;
    let image = match upload {
        Some(file) => Some(resolve_attachment(&state, file).await?),
        None => None,
    };
    let record = BookRecord::new(submission, image);
    state.store.insert_book(&record)?;
    state.telemetry.publish(CatalogEvent::RecordCreated {
        id: record.id.clone(),
        timestamp: Utc::now(),
    })?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_book(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<BookRecord>, ApiError> {
    let BookForm { mut fields, upload } = read_book_form(multipart).await?;
    if let Some(file) = upload {
        fields.image = Some(resolve_attachment(&state, file).await?);
    }
    let record = state
        .store
        .update_book(&id, fields)?
        .ok_or_else(|| CatalogError::NotFound("book not found".to_string()))?;
    state.telemetry.publish(CatalogEvent::RecordUpdated {
        id: record.id.clone(),
        timestamp: Utc::now(),
    })?;
    Ok(Json(record))
}

async fn delete_book(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_book(&id)? {
        return Err(CatalogError::NotFound("book not found".to_string()).into());
    }
    state.telemetry.publish(CatalogEvent::RecordDeleted {
        id,
        timestamp: Utc::now(),
    })?;
    Ok(Json(serde_json::json!({ "message": "Book deleted successfully" })))
}

async fn resolve_attachment(state: &ApiState, file: UploadedFile) -> Result<String, ApiError> {
    let reference = state.attachments.resolve(file).await?;
    state.telemetry.publish(CatalogEvent::AssetStored {
        reference: reference.clone(),
        timestamp: Utc::now(),
    })?;
    Ok(reference)
}

struct BookForm {
    fields: BookPatch,
    upload: Option<UploadedFile>,
}

/// Collects the multipart request into text fields plus an optional
/// `image` file part. Unknown parts are ignored; an image part with an
/// empty body counts as "no file supplied".
async fn read_book_form(mut multipart: Multipart) -> CatalogResult<BookForm> {
    let mut fields = BookPatch::default();
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| CatalogError::Validation(format!("malformed multipart request: {err}")))?
    {
        let Some(name) = field.name().map(|name| name.to_string()) else {
            continue;
        };
        if name == "image" {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let bytes = field.bytes().await.map_err(|err| {
                CatalogError::Validation(format!("malformed multipart request: {err}"))
            })?;
            if !bytes.is_empty() {
                upload = Some(UploadedFile { filename, bytes });
            }
            continue;
        }
        let value = field.text().await.map_err(|err| {
            CatalogError::Validation(format!("malformed multipart request: {err}"))
        })?;
        match name.as_str() {
            "title" => fields.title = Some(value),
            "author" => fields.author = Some(value),
            "publisher" => fields.publisher = Some(value),
            "publishedDate" => fields.published_date = Some(value),
            "pages" => fields.pages = Some(value),
            "description" => fields.description = Some(value),
            _ => {}
        }
    }
    Ok(BookForm { fields, upload })
}

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

async fn register(
    State(state): State<ApiState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate().map_err(CatalogError::from)?;
    if state.store.find_user_by_email(&request.email)?.is_some() {
        return Err(CatalogError::Conflict("user already exists".to_string()).into());
    }
    let account = UserAccount::new(&request.email, &request.password)?;
    state.store.put_user(&account)?;
    state.telemetry.publish(CatalogEvent::UserRegistered {
        email: account.email.clone(),
        timestamp: Utc::now(),
    })?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

#[derive(Debug, Deserialize, Validate)]
struct LoginRequest {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, message = "password is required"))]
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: DateTime<Utc>,
    user: UserResponse,
}

async fn login(
    State(state): State<ApiState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate().map_err(CatalogError::from)?;
    let account = state
        .store
        .find_user_by_email(&request.email)?
        .ok_or(CatalogError::Authentication)?;
    if !auth::verify_password(&account.password_hash, &request.password)? {
        return Err(CatalogError::Authentication.into());
    }
    let token = state.signer.issue(&account.id, &account.email)?;
    let expires_at = Utc::now() + chrono::Duration::minutes(state.signer.expiry_minutes());
    Ok(Json(LoginResponse {
        token,
        expires_at,
        user: UserResponse::from(account),
    }))
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
}

pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        let body = Json(ApiErrorBody {
            error: self.0.public_message(),
        });
        (status, body).into_response()
    }
}
