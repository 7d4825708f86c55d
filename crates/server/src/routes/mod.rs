pub mod compress;
pub mod convert;
pub mod resize;
pub mod watermark;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use pixelpress_core::{
    size_reduction_percent, AppConfig, Pipeline, PipelineError, RemoteFetcher, SourceResolver,
    TransformResult,
};

use crate::error::ServerResult;
use crate::extract::{base_url, CollectedForm, UploadedFile};

/// Shared per-request dependencies. The fetcher sits behind a trait object so
/// tests can run the URL routes against a stub.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub resolver: SourceResolver,
    pub fetcher: Arc<dyn RemoteFetcher>,
    pub config: AppConfig,
}

/// Route table for the whole service. Transformed artifacts are served
/// statically under `/optimized`; the scratch directory is never exposed.
pub fn create_router(state: AppState) -> Router {
    let serve_dir = ServeDir::new(state.config.storage.output_dir.clone());

    Router::new()
        .route("/health", get(health))
        .route("/compress", post(compress::upload))
        .route("/compress/url", post(compress::from_url))
        .route("/convert/webp", post(convert::upload))
        .route("/convert/webp/url", post(convert::from_url))
        .route("/resize", post(resize::upload))
        .route("/resize/url", post(resize::from_url))
        .route("/resize/thumbnail", post(resize::thumbnail))
        .route("/resize/thumbnail/url", post(resize::thumbnail_from_url))
        .route("/watermark/text", post(watermark::text))
        .route("/watermark/text/url", post(watermark::text_from_url))
        .route("/watermark/image", post(watermark::image))
        .route("/watermark/image/url", post(watermark::image_from_url))
        .nest_service("/optimized", serve_dir)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Required text field, rejecting absent and blank values alike.
pub(crate) fn require_text<'a>(value: Option<&'a str>, message: &str) -> ServerResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PipelineError::InvalidRequest(message.to_string()).into())
}

/// Required file part of a collected form.
pub(crate) fn require_file<'a>(
    form: &'a CollectedForm,
    name: &str,
    message: &str,
) -> ServerResult<&'a UploadedFile> {
    form.file(name)
        .ok_or_else(|| PipelineError::InvalidRequest(message.to_string()).into())
}

fn artifact_urls(state: &AppState, headers: &HeaderMap, result: &TransformResult) -> (String, String) {
    let url = state.pipeline.store().url_path(&result.filename);
    let full_url = format!("{}{url}", base_url(headers));
    (url, full_url)
}

/// `{url, fullUrl}` body used by the resize, thumbnail, and watermark routes.
pub(crate) fn transformed_body(
    state: &AppState,
    headers: &HeaderMap,
    result: &TransformResult,
) -> Json<Value> {
    let (url, full_url) = artifact_urls(state, headers, result);
    Json(json!({ "url": url, "fullUrl": full_url }))
}

/// `{optimized_url, ipfs_cid, size_reduction}` body used by the compress and
/// convert routes. Registers the artifact with the content store; a null
/// `ipfs_cid` marks a degraded success.
pub(crate) async fn optimized_body(
    state: &AppState,
    headers: &HeaderMap,
    result: &TransformResult,
) -> Json<Value> {
    let (_, full_url) = artifact_urls(state, headers, result);
    let cid = state.pipeline.register_content(result).await;
    let reduction = size_reduction_percent(result.original_size, result.byte_size);

    Json(json!({
        "optimized_url": full_url,
        "ipfs_cid": cid,
        "size_reduction": format!("{reduction:.2}%"),
    }))
}
