use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use pixelpress_core::{CleanupScope, PipelineError};
use pixelpress_imaging::{Anchor, Operation};

use crate::error::ServerResult;
use crate::extract::{collect_form, parse_or, CollectedForm};
use crate::routes::{require_file, require_text, transformed_body, AppState};

const DEFAULT_FONT_SIZE: u32 = 24;
const DEFAULT_COLOR: &str = "white";
const DEFAULT_OPACITY: f32 = 0.7;
const DEFAULT_MARGIN: u32 = 20;
const DEFAULT_SCALE: f32 = 0.2;

fn text_operation(form: &CollectedForm) -> ServerResult<Operation> {
    let text = require_text(form.text("text"), "Watermark text is required")?;
    Ok(Operation::TextWatermark {
        text: text.to_string(),
        font_size: parse_or(form.text("fontSize"), DEFAULT_FONT_SIZE),
        color: form.text("color").unwrap_or(DEFAULT_COLOR).to_string(),
        opacity: parse_or(form.text("opacity"), DEFAULT_OPACITY),
        anchor: Anchor::parse(form.text("position").unwrap_or_default()),
        margin: parse_or(form.text("margin"), DEFAULT_MARGIN),
    })
}

/// `POST /watermark/text` — multipart `image`, `text` required, optional
/// `fontSize`, `color`, `opacity`, `position`, `margin`.
pub async fn text(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let form = collect_form(multipart).await?;
    let mut scope = CleanupScope::new();

    let outcome = async {
        let file = require_file(&form, "image", "No image file provided")?;
        let op = text_operation(&form)?;

        let source = state
            .resolver
            .stage_upload(&file.bytes, file.content_type.clone(), &file.filename, &mut scope)
            .await?;
        let result = state.pipeline.execute(&source, op).await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextUrlRequest {
    pub image_url: Option<String>,
    pub text: Option<String>,
    pub font_size: Option<u32>,
    pub color: Option<String>,
    pub opacity: Option<f32>,
    pub position: Option<String>,
    pub margin: Option<u32>,
}

/// `POST /watermark/text/url` — JSON
/// `{imageUrl, text, fontSize, color, opacity, position, margin}`.
pub async fn text_from_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TextUrlRequest>,
) -> ServerResult<Json<Value>> {
    let mut scope = CleanupScope::new();

    let outcome = async {
        let url = require_text(request.image_url.as_deref(), "Image URL is required")?;
        let text = require_text(request.text.as_deref(), "Watermark text is required")?;
        let op = Operation::TextWatermark {
            text: text.to_string(),
            font_size: request.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            color: request.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            opacity: request.opacity.unwrap_or(DEFAULT_OPACITY),
            anchor: Anchor::parse(request.position.as_deref().unwrap_or_default()),
            margin: request.margin.unwrap_or(DEFAULT_MARGIN),
        };

        let source = state
            .resolver
            .stage_remote(url, state.fetcher.as_ref(), &mut scope)
            .await?;
        let result = state.pipeline.execute(&source, op).await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

/// `POST /watermark/image` — multipart `image` and `watermark`, both
/// required; optional `opacity`, `position`, `margin`, `scale`.
pub async fn image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let form = collect_form(multipart).await?;
    let mut scope = CleanupScope::new();

    let outcome = async {
        let file = require_file(&form, "image", "No image file provided")?;
        let mark = require_file(&form, "watermark", "No watermark file provided")?;
        let op = Operation::ImageWatermark {
            watermark: mark.bytes.clone(),
            opacity: parse_or(form.text("opacity"), DEFAULT_OPACITY),
            anchor: Anchor::parse(form.text("position").unwrap_or_default()),
            margin: parse_or(form.text("margin"), DEFAULT_MARGIN),
            scale: parse_or(form.text("scale"), DEFAULT_SCALE),
        };

        let source = state
            .resolver
            .stage_upload(&file.bytes, file.content_type.clone(), &file.filename, &mut scope)
            .await?;
        let result = state.pipeline.execute(&source, op).await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlRequest {
    pub image_url: Option<String>,
    pub watermark_url: Option<String>,
    pub opacity: Option<f32>,
    pub position: Option<String>,
    pub margin: Option<u32>,
    pub scale: Option<f32>,
}

/// `POST /watermark/image/url` — JSON
/// `{imageUrl, watermarkUrl, opacity, position, margin, scale}`. The image
/// and the watermark are fetched concurrently.
pub async fn image_from_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImageUrlRequest>,
) -> ServerResult<Json<Value>> {
    let mut scope = CleanupScope::new();

    let outcome = async {
        let url = require_text(request.image_url.as_deref(), "Image URL is required")?;
        let watermark_url =
            require_text(request.watermark_url.as_deref(), "Watermark URL is required")?;

        let (source, watermark_path) = state
            .resolver
            .stage_remote_with_watermark(url, watermark_url, state.fetcher.as_ref(), &mut scope)
            .await?;
        let watermark = tokio::fs::read(&watermark_path)
            .await
            .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;

        let op = Operation::ImageWatermark {
            watermark,
            opacity: request.opacity.unwrap_or(DEFAULT_OPACITY),
            anchor: Anchor::parse(request.position.as_deref().unwrap_or_default()),
            margin: request.margin.unwrap_or(DEFAULT_MARGIN),
            scale: request.scale.unwrap_or(DEFAULT_SCALE),
        };
        let result = state.pipeline.execute(&source, op).await?;

        Ok(transformed_body(&state, &headers, &result))
    }
    .await;

    scope.release().await;
    outcome
}
