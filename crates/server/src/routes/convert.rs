use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use pixelpress_core::CleanupScope;
use pixelpress_imaging::Operation;

use crate::error::ServerResult;
use crate::extract::{collect_form, parse_or};
use crate::routes::{optimized_body, require_file, require_text, AppState};

/// Conversion uses its own default regardless of how the source arrived.
const DEFAULT_QUALITY: u8 = 80;

/// `POST /convert/webp` — multipart `image`, optional `quality` (default 80).
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ServerResult<Json<Value>> {
    let form = collect_form(multipart).await?;
    let mut scope = CleanupScope::new();

    let outcome = async {
        let file = require_file(&form, "image", "No image file provided")?;
        let quality = parse_or(form.text("quality"), DEFAULT_QUALITY);

        let source = state
            .resolver
            .stage_upload(&file.bytes, file.content_type.clone(), &file.filename, &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(&source, Operation::ConvertWebp { quality })
            .await?;

        Ok(optimized_body(&state, &headers, &result).await)
    }
    .await;

    scope.release().await;
    outcome
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertUrlRequest {
    pub image_url: Option<String>,
    pub quality: Option<u8>,
}

/// `POST /convert/webp/url` — JSON `{imageUrl, quality}` (default 80).
pub async fn from_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ConvertUrlRequest>,
) -> ServerResult<Json<Value>> {
    let mut scope = CleanupScope::new();

    let outcome = async {
        let url = require_text(request.image_url.as_deref(), "Image URL is required")?;
        let quality = request.quality.unwrap_or(DEFAULT_QUALITY);

        let source = state
            .resolver
            .stage_remote(url, state.fetcher.as_ref(), &mut scope)
            .await?;
        let result = state
            .pipeline
            .execute(&source, Operation::ConvertWebp { quality })
            .await?;

        Ok(optimized_body(&state, &headers, &result).await)
    }
    .await;

    scope.release().await;
    outcome
}
