use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error taxonomy for the whole request pipeline. The server maps the first
/// two variants to 400 and the rest to 500; every variant still runs the
/// request's cleanup scope before a response is written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("Failed to fetch remote image: {0}")]
    AcquisitionFailed(String),

    #[error("Image transformation failed: {0}")]
    TransformationFailed(String),

    #[error("Failed to publish result: {0}")]
    PublicationFailed(String),
}

impl From<pixelpress_imaging::ImagingError> for PipelineError {
    fn from(err: pixelpress_imaging::ImagingError) -> Self {
        Self::TransformationFailed(err.to_string())
    }
}

impl From<pixelpress_storage::StorageError> for PipelineError {
    fn from(err: pixelpress_storage::StorageError) -> Self {
        Self::PublicationFailed(err.to_string())
    }
}
