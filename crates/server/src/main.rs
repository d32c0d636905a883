use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    assessment::assess,
    domain::{ClassificationResult, RawPrediction},
    error::ErrorBody,
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod config;

use config::{load_settings, prepare_backend_base_url};

/// Multipart field the client uploads under.
const UPLOAD_FIELD: &str = "image";
/// Multipart field the prediction backend expects.
const FORWARD_FIELD: &str = "file";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    http: reqwest::Client,
    backend_base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let backend_base_url = prepare_backend_base_url(&settings.backend_base_url)?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.backend_timeout_secs))
        .build()?;

    let state = AppState {
        http,
        backend_base_url,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, backend = %settings.backend_base_url, "classifier proxy listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/classifier", post(classify))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

struct ImageUpload {
    content: Vec<u8>,
    file_name: String,
    content_type: String,
}

/// Relays an uploaded book photo to the prediction backend and returns the
/// normalized assessment. Backend failure statuses pass through verbatim
/// with the backend's diagnostic text in the error body.
async fn classify(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ClassificationResult>, (StatusCode, Json<ErrorBody>)> {
    let upload = read_image_field(multipart).await?;

    let part = reqwest::multipart::Part::bytes(upload.content)
        .file_name(upload.file_name)
        .mime_str(&upload.content_type)
        .map_err(|err| {
            error!(%err, "upload carried an unusable content type");
            server_error()
        })?;
    let form = reqwest::multipart::Form::new().part(FORWARD_FIELD, part);

    let response = state
        .http
        .post(format!("{}/predict", state.backend_base_url))
        .multipart(form)
        .send()
        .await
        .map_err(|err| {
            error!(%err, "prediction backend request failed");
            server_error()
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, %body, "prediction backend rejected the upload");
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err((status, Json(ErrorBody::new(body))));
    }

    let raw: RawPrediction = response.json().await.map_err(|err| {
        error!(%err, "prediction backend returned an unparseable body");
        server_error()
    })?;
    if !raw.is_known_label() {
        warn!(label = %raw.prediction, "unrecognized prediction label; mapping to the good-condition branch");
    }

    Ok(Json(assess(&raw)))
}

async fn read_image_field(
    mut multipart: Multipart,
) -> Result<ImageUpload, (StatusCode, Json<ErrorBody>)> {
    loop {
        let field = multipart.next_field().await.map_err(|err| {
            error!(%err, "failed to read multipart upload");
            server_error()
        })?;
        let Some(field) = field else {
            return Err(no_image_uploaded());
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = field.bytes().await.map_err(|err| {
            error!(%err, "failed to read uploaded image bytes");
            server_error()
        })?;
        return Ok(ImageUpload {
            content: content.to_vec(),
            file_name,
            content_type,
        });
    }
}

fn no_image_uploaded() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new("No image uploaded")),
    )
}

fn server_error() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new("Server error")),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
