use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use pixelpress_imaging::{transform, Operation};
use pixelpress_storage::{ContentStore, LocalStore};

use crate::error::{PipelineError, PipelineResult};
use crate::naming::output_filename;
use crate::source::SourceArtifact;
use crate::validate::validate_mime;

/// Outcome of one executed operation: the published artifact plus the sizes
/// the response metrics are computed from.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub filename: String,
    pub output_path: PathBuf,
    pub byte_size: u64,
    pub original_size: u64,
}

/// Orchestrates validate, transform, and publish for a staged source.
///
/// Holds the durable store and the optional content-addressed store; source
/// staging and cleanup live with the caller so one scope spans the whole
/// request.
pub struct Pipeline {
    store: LocalStore,
    content_store: Option<Arc<dyn ContentStore>>,
}

impl Pipeline {
    pub fn new(store: LocalStore, content_store: Option<Arc<dyn ContentStore>>) -> Self {
        Self {
            store,
            content_store,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Run one operation against a staged source and publish the result.
    ///
    /// Validation precedes any decode work, and the decode/encode itself runs
    /// on the blocking pool so codec work never stalls the request executor.
    pub async fn execute(
        &self,
        source: &SourceArtifact,
        op: Operation,
    ) -> PipelineResult<TransformResult> {
        let format = validate_mime(source.mime.as_deref())?;

        let input = tokio::fs::read(&source.local_path).await.map_err(|e| {
            PipelineError::TransformationFailed(format!("failed to read staged image: {e}"))
        })?;
        if input.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "Image file is empty".to_string(),
            ));
        }
        let original_size = input.len() as u64;

        let filename = output_filename(
            &source.logical_filename,
            op.output_suffix(),
            op.output_extension(format),
        );

        let encoded = tokio::task::spawn_blocking(move || transform(&input, &op, format))
            .await
            .map_err(|e| PipelineError::TransformationFailed(format!("codec task failed: {e}")))??;

        let byte_size = self.store.publish(&filename, &encoded).await?;
        let output_path = self.store.path_for(&filename);
        debug!("Transformed {:?} -> {}", source.logical_filename, filename);

        Ok(TransformResult {
            filename,
            output_path,
            byte_size,
            original_size,
        })
    }

    /// Register a published artifact with the content-addressed store.
    ///
    /// Returns the content identifier, or `None` when the store is disabled
    /// or failed. A failure degrades the response rather than voiding the
    /// transformation, so it is logged and swallowed here.
    pub async fn register_content(&self, result: &TransformResult) -> Option<String> {
        let content_store = self.content_store.as_ref()?;

        let bytes = match self.store.read(&result.filename).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not reread {} for content store: {}", result.filename, e);
                return None;
            }
        };

        match content_store.put(bytes).await {
            Ok(cid) => Some(cid),
            Err(e) => {
                warn!("Content store registration failed for {}: {}", result.filename, e);
                None
            }
        }
    }
}

/// Percentage by which the output shrank relative to the input, rounded to
/// two decimal places. Negative when the output grew.
pub fn size_reduction_percent(original_size: u64, result_size: u64) -> f64 {
    let pct = (original_size as f64 - result_size as f64) / original_size as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::CleanupScope;
    use crate::source::SourceResolver;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use pixelpress_storage::{StorageError, StorageResult};
    use std::io::Cursor;
    use tempfile::tempdir;

    struct StubContentStore;

    #[async_trait]
    impl ContentStore for StubContentStore {
        async fn put(&self, _data: Vec<u8>) -> StorageResult<String> {
            Ok("QmStubCid".to_string())
        }
    }

    struct BrokenContentStore;

    #[async_trait]
    impl ContentStore for BrokenContentStore {
        async fn put(&self, _data: Vec<u8>) -> StorageResult<String> {
            Err(StorageError::ContentStore("daemon down".to_string()))
        }
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([9, 9, 9, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    async fn staged_png(resolver: &SourceResolver, scope: &mut CleanupScope) -> SourceArtifact {
        resolver
            .stage_upload(
                &png_bytes(320, 200),
                Some("image/png".into()),
                "sample.png",
                scope,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn execute_publishes_with_derived_name() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(LocalStore::new(out.path().to_path_buf()), None);

        let mut scope = CleanupScope::new();
        let source = staged_png(&resolver, &mut scope).await;

        let result = pipeline
            .execute(&source, Operation::Compress { quality: 80 })
            .await
            .unwrap();

        assert_eq!(result.filename, "sample-compressed.png");
        assert!(result.output_path.exists());
        assert_eq!(result.original_size, png_bytes(320, 200).len() as u64);
        assert_eq!(
            result.byte_size,
            std::fs::metadata(&result.output_path).unwrap().len()
        );
        scope.release().await;
    }

    #[tokio::test]
    async fn thumbnail_keeps_source_extension_despite_jpeg_bytes() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(LocalStore::new(out.path().to_path_buf()), None);

        let mut scope = CleanupScope::new();
        let source = staged_png(&resolver, &mut scope).await;

        let result = pipeline
            .execute(&source, Operation::Thumbnail { size: 150 })
            .await
            .unwrap();

        assert_eq!(result.filename, "sample-thumbnail.png");
        let bytes = std::fs::read(&result.output_path).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8], "thumbnail bytes are not JPEG");
        scope.release().await;
    }

    #[tokio::test]
    async fn webp_conversion_renames_to_webp() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(LocalStore::new(out.path().to_path_buf()), None);

        let mut scope = CleanupScope::new();
        let source = staged_png(&resolver, &mut scope).await;

        let result = pipeline
            .execute(&source, Operation::ConvertWebp { quality: 80 })
            .await
            .unwrap();
        assert_eq!(result.filename, "sample-webp.webp");
        scope.release().await;
    }

    #[tokio::test]
    async fn unsupported_mime_is_rejected_before_any_output() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(LocalStore::new(out.path().to_path_buf()), None);

        let mut scope = CleanupScope::new();
        let source = resolver
            .stage_upload(b"BMdata", Some("image/bmp".into()), "pic.bmp", &mut scope)
            .await
            .unwrap();

        let err = pipeline
            .execute(&source, Operation::Compress { quality: 80 })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
        scope.release().await;
    }

    #[tokio::test]
    async fn empty_source_is_an_invalid_request() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(LocalStore::new(out.path().to_path_buf()), None);

        let mut scope = CleanupScope::new();
        let source = resolver
            .stage_upload(b"", Some("image/png".into()), "void.png", &mut scope)
            .await
            .unwrap();

        let err = pipeline
            .execute(&source, Operation::Compress { quality: 80 })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
        scope.release().await;
    }

    #[tokio::test]
    async fn content_registration_returns_cid_when_store_works() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(
            LocalStore::new(out.path().to_path_buf()),
            Some(Arc::new(StubContentStore)),
        );

        let mut scope = CleanupScope::new();
        let source = staged_png(&resolver, &mut scope).await;
        let result = pipeline
            .execute(&source, Operation::Compress { quality: 80 })
            .await
            .unwrap();

        assert_eq!(
            pipeline.register_content(&result).await.as_deref(),
            Some("QmStubCid")
        );
        scope.release().await;
    }

    #[tokio::test]
    async fn content_store_failure_degrades_to_none() {
        let scratch = tempdir().unwrap();
        let out = tempdir().unwrap();
        let resolver = SourceResolver::new(scratch.path().to_path_buf());
        let pipeline = Pipeline::new(
            LocalStore::new(out.path().to_path_buf()),
            Some(Arc::new(BrokenContentStore)),
        );

        let mut scope = CleanupScope::new();
        let source = staged_png(&resolver, &mut scope).await;
        let result = pipeline
            .execute(&source, Operation::Compress { quality: 80 })
            .await
            .unwrap();

        assert!(pipeline.register_content(&result).await.is_none());
        assert!(result.output_path.exists());
        scope.release().await;
    }

    #[test]
    fn size_reduction_rounds_to_two_decimals() {
        assert_eq!(size_reduction_percent(1_000_000, 400_000), 60.0);
        assert_eq!(size_reduction_percent(3, 1), 66.67);
        assert_eq!(size_reduction_percent(100, 150), -50.0);
    }
}
