//! Transformation orchestration: acquire a source image, validate it,
//! dispatch one operation through the codec adapter, publish the result,
//! and release every temporary artifact on all paths.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod source;
pub mod validate;

pub use cleanup::CleanupScope;
pub use config::AppConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{size_reduction_percent, Pipeline, TransformResult};
pub use source::{
    FetchedResource, HttpFetcher, RemoteFetcher, SourceArtifact, SourceOrigin, SourceResolver,
};
