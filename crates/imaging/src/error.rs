use thiserror::Error;

pub type ImagingResult<T> = Result<T, ImagingError>;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to decode watermark image: {0}")]
    WatermarkDecode(String),

    #[error("failed to encode {0} output: {1}")]
    Encode(&'static str, String),
}
