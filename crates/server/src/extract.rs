use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;
use axum::http::HeaderMap;

use crate::error::{ServerError, ServerResult};

/// One file part of a multipart request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// A fully collected multipart form: file parts keyed by part name, text
/// parts as strings. Collected up front so handlers see a plain value
/// instead of a streaming extractor.
#[derive(Debug, Default)]
pub struct CollectedForm {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl CollectedForm {
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Drain a multipart stream into a [`CollectedForm`]. Parts with a filename
/// are treated as files, everything else as text fields; stream errors
/// surface as a 400.
pub async fn collect_form(mut multipart: Multipart) -> ServerResult<CollectedForm> {
    let mut form = CollectedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::Multipart(e.to_string()))?
                .to_vec();
            form.files.insert(
                name,
                UploadedFile {
                    bytes,
                    filename,
                    content_type,
                },
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ServerError::Multipart(e.to_string()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Parse an optional text field, falling back to `default` when the field is
/// absent or unparsable. An explicit `"0"` is honored as zero.
pub fn parse_or<T: FromStr>(value: Option<&str>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Origin the absolute URLs in responses are built from. Proxy headers win
/// over the request's own `Host`.
pub fn base_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}")
}
