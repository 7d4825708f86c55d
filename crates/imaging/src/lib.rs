//! Image codec adapter.
//!
//! Pure byte-in/byte-out transformations over a closed set of operations:
//! decode, geometric transform, composite, encode. No filesystem or network
//! access happens here; callers hand in source bytes (and watermark bytes
//! where relevant) and get encoded output back.

pub mod anchor;
pub mod color;
pub mod encode;
pub mod error;
pub mod fit;
pub mod format;
pub mod ops;
pub mod text;

pub use anchor::Anchor;
pub use error::{ImagingError, ImagingResult};
pub use fit::FitMode;
pub use format::ImageFormat;
pub use ops::{transform, Operation, MAX_BOUND};
