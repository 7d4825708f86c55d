use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use pixelpress_core::PipelineError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Pipeline(err) => {
                let status = match err {
                    PipelineError::InvalidRequest(_) | PipelineError::UnsupportedFormat(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    PipelineError::AcquisitionFailed(_)
                    | PipelineError::TransformationFailed(_)
                    | PipelineError::PublicationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ServerError::Multipart(msg) => (StatusCode::BAD_REQUEST, format!("Malformed multipart request: {msg}")),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let response =
            ServerError::from(PipelineError::InvalidRequest("Width is required".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ServerError::from(PipelineError::UnsupportedFormat("nope".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn processing_errors_map_to_internal_error() {
        for err in [
            PipelineError::AcquisitionFailed("timeout".into()),
            PipelineError::TransformationFailed("bad bytes".into()),
            PipelineError::PublicationFailed("disk full".into()),
        ] {
            let response = ServerError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
