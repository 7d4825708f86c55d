use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use pixelpress_core::{CleanupScope, PipelineError};
use pixelpress_imaging::{FitMode, Operation};

use crate::error::ServerResult;
use crate::extract::{collect_form, parse_or};
use crate::routes::{require_file, require_text, transformed_body, AppState};

const DEFAULT_THUMBNAIL_SIZE: u32 = 150;

fn parse_width(value: Option<&str>) -> ServerResult<u32> {
    require_text(value, "Width is required")?
        .parse()
        .map_err(|_| PipelineError::InvalidRequest("Width must be a positive number".to_string()).into())
}

fn parse_fit(value: Option<&str>) -> ServerResult<FitMode> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|e: String| PipelineError::InvalidRequest(e).into()),
        None => Ok(FitMode::default()),
    }
}

/// `POST /resize` — multipart `image`, `width` required, optional `height`
/// and `fit` (default cover).
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let form = collect_form(multipart).await?;
    let mut scope = CleanupScope::new();

    let outcome = async {
        let file = require_file(&form, "image", "No image file provided")?;
        let width = parse_width(form.text("width"))?;
        let height = form.text("height").and_then(|v| v.trim().parse().ok());
        let fit = parse_fit(form.text("fit"))?;

        let source = state
            .resolver
            .stage_upload(&file.bytes, file.content_type.clone(), &file.filename, &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(&source, Operation::Resize { width, height, fit })
            .await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeUrlRequest {
    pub image_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Option<String>,
}

/// `POST /resize/url` — JSON `{imageUrl, width, height, fit}`.
pub async fn from_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResizeUrlRequest>,
) -> ServerResult<Json<Value>> {
    let mut scope = CleanupScope::new();

    let outcome = async {
        let url = require_text(request.image_url.as_deref(), "Image URL is required")?;
        let width = request
            .width
            .ok_or_else(|| PipelineError::InvalidRequest("Width is required".to_string()))?;
        let fit = parse_fit(request.fit.as_deref())?;

        let source = state
            .resolver
            .stage_remote(url, state.fetcher.as_ref(), &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(
                &source,
                Operation::Resize {
                    width,
                    height: request.height,
                    fit,
                },
            )
            .await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

/// `POST /resize/thumbnail` — multipart `image`, optional `size` (default 150).
pub async fn thumbnail(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let form = collect_form(multipart).await?;
    let mut scope = CleanupScope::new();

    let outcome = async {
        let file = require_file(&form, "image", "No image file provided")?;
        let size = parse_or(form.text("size"), DEFAULT_THUMBNAIL_SIZE);

        let source = state
            .resolver
            .stage_upload(&file.bytes, file.content_type.clone(), &file.filename, &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(&source, Operation::Thumbnail { size })
            .await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailUrlRequest {
    pub image_url: Option<String>,
    pub size: Option<u32>,
}

/// `POST /resize/thumbnail/url` — JSON `{imageUrl, size}`.
pub async fn thumbnail_from_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ThumbnailUrlRequest>,
) -> ServerResult<Json<Value>> {
    let mut scope = CleanupScope::new();

    let outcome = async {
        let url = require_text(request.image_url.as_deref(), "Image URL is required")?;
        let size = request.size.unwrap_or(DEFAULT_THUMBNAIL_SIZE);

        let source = state
            .resolver
            .stage_remote(url, state.fetcher.as_ref(), &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(&source, Operation::Thumbnail { size })
            .await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}
