use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use pixelpress_imaging::ImageFormat;

use crate::cleanup::CleanupScope;
use crate::error::{PipelineError, PipelineResult};
use crate::naming::{remote_logical_filename, timestamp_millis};

/// How the source image reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Upload,
    RemoteFetch,
}

/// A staged source image: a scratch file on disk plus the metadata the rest
/// of the pipeline derives names and validation from. The scratch file is
/// owned by the request's [`CleanupScope`], not by this struct.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    pub local_path: PathBuf,
    /// Declared content type, if any. Validation happens downstream.
    pub mime: Option<String>,
    /// Name the output filename is derived from.
    pub logical_filename: String,
    pub origin: SourceOrigin,
}

/// Body and content type of a fetched remote resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Seam for fetching remote images over HTTP. Swapped for a stub in tests so
/// URL-sourced routes are exercised without a network.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn get(&self, url: &str) -> PipelineResult<FetchedResource>;
}

/// Production fetcher backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> PipelineResult<FetchedResource> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::AcquisitionFailed(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(strip_mime_params);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;

        Ok(FetchedResource {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// `image/png; charset=binary` -> `image/png`.
fn strip_mime_params(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or(value)
        .trim()
        .to_ascii_lowercase()
}

/// Stages source images into the scratch directory and registers every file
/// it creates with the request's cleanup scope.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    upload_dir: PathBuf,
}

impl SourceResolver {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    async fn ensure(&self) -> PipelineResult<()> {
        if !self.upload_dir.exists() {
            debug!("Creating scratch directory: {:?}", self.upload_dir);
            fs::create_dir_all(&self.upload_dir)
                .await
                .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;
        }
        Ok(())
    }

    async fn write_scratch(
        &self,
        filename: &str,
        bytes: &[u8],
        scope: &mut CleanupScope,
    ) -> PipelineResult<PathBuf> {
        self.ensure().await?;
        let path = self.upload_dir.join(filename);
        fs::write(&path, bytes)
            .await
            .map_err(|e| PipelineError::AcquisitionFailed(e.to_string()))?;
        scope.register(&path);
        Ok(path)
    }

    /// Stage a multipart upload. The declared part content type wins; when
    /// the client sent none, the original filename's extension is consulted.
    pub async fn stage_upload(
        &self,
        bytes: &[u8],
        declared_mime: Option<String>,
        original_filename: &str,
        scope: &mut CleanupScope,
    ) -> PipelineResult<SourceArtifact> {
        let mime = declared_mime.map(|m| strip_mime_params(&m)).or_else(|| {
            original_filename
                .rsplit_once('.')
                .and_then(|(_, ext)| ImageFormat::from_extension(ext))
                .map(|f| f.mime().to_string())
        });

        let local_path = self
            .write_scratch(&Uuid::new_v4().simple().to_string(), bytes, scope)
            .await?;

        Ok(SourceArtifact {
            local_path,
            mime,
            logical_filename: original_filename.to_string(),
            origin: SourceOrigin::Upload,
        })
    }

    /// Fetch a remote image and stage it as `<millis>.<ext>`.
    pub async fn stage_remote(
        &self,
        image_url: &str,
        fetcher: &dyn RemoteFetcher,
        scope: &mut CleanupScope,
    ) -> PipelineResult<SourceArtifact> {
        let fetched = fetcher.get(image_url).await?;
        self.stage_fetched(image_url, fetched, scope).await
    }

    /// Fetch a remote image and a remote watermark concurrently, then stage
    /// both. Either failure aborts before anything touches disk.
    pub async fn stage_remote_with_watermark(
        &self,
        image_url: &str,
        watermark_url: &str,
        fetcher: &dyn RemoteFetcher,
        scope: &mut CleanupScope,
    ) -> PipelineResult<(SourceArtifact, PathBuf)> {
        let (image, watermark) =
            tokio::try_join!(fetcher.get(image_url), fetcher.get(watermark_url))?;

        let artifact = self.stage_fetched(image_url, image, scope).await?;
        let watermark_path = self
            .write_scratch(
                &format!("watermark-{}.png", timestamp_millis()),
                &watermark.bytes,
                scope,
            )
            .await?;

        Ok((artifact, watermark_path))
    }

    async fn stage_fetched(
        &self,
        image_url: &str,
        fetched: FetchedResource,
        scope: &mut CleanupScope,
    ) -> PipelineResult<SourceArtifact> {
        let ext = fetched
            .content_type
            .as_deref()
            .and_then(ImageFormat::from_mime)
            .map(|f| f.extension())
            .unwrap_or("jpg");

        let millis = timestamp_millis();
        let local_path = self
            .write_scratch(&format!("{millis}.{ext}"), &fetched.bytes, scope)
            .await?;

        Ok(SourceArtifact {
            local_path,
            mime: fetched.content_type,
            logical_filename: remote_logical_filename(image_url, ext, millis),
            origin: SourceOrigin::RemoteFetch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct StubFetcher {
        content_type: Option<&'static str>,
        body: Vec<u8>,
    }

    #[async_trait]
    impl RemoteFetcher for StubFetcher {
        async fn get(&self, _url: &str) -> PipelineResult<FetchedResource> {
            Ok(FetchedResource {
                bytes: self.body.clone(),
                content_type: self.content_type.map(String::from),
            })
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl RemoteFetcher for FailingFetcher {
        async fn get(&self, url: &str) -> PipelineResult<FetchedResource> {
            Err(PipelineError::AcquisitionFailed(format!("{url} unreachable")))
        }
    }

    #[tokio::test]
    async fn upload_uses_declared_mime_and_keeps_original_name() {
        let dir = tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path().to_path_buf());
        let mut scope = CleanupScope::new();

        let artifact = resolver
            .stage_upload(b"bytes", Some("image/png".into()), "cat.png", &mut scope)
            .await
            .unwrap();

        assert_eq!(artifact.mime.as_deref(), Some("image/png"));
        assert_eq!(artifact.logical_filename, "cat.png");
        assert_eq!(artifact.origin, SourceOrigin::Upload);
        assert!(artifact.local_path.exists());
        assert_eq!(scope.len(), 1);

        scope.release().await;
        assert!(!artifact.local_path.exists());
    }

    #[tokio::test]
    async fn upload_falls_back_to_extension_sniffing() {
        let dir = tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path().to_path_buf());
        let mut scope = CleanupScope::new();

        let artifact = resolver
            .stage_upload(b"bytes", None, "photo.JPG", &mut scope)
            .await
            .unwrap();
        assert_eq!(artifact.mime.as_deref(), Some("image/jpeg"));

        let artifact = resolver
            .stage_upload(b"bytes", None, "mystery", &mut scope)
            .await
            .unwrap();
        assert_eq!(artifact.mime, None);
        scope.release().await;
    }

    #[tokio::test]
    async fn remote_stage_names_by_timestamp_and_content_type() {
        let dir = tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path().to_path_buf());
        let mut scope = CleanupScope::new();

        let fetcher = StubFetcher {
            content_type: Some("image/png"),
            body: b"png-bytes".to_vec(),
        };
        let artifact = resolver
            .stage_remote("https://example.com/pics/dog.png", &fetcher, &mut scope)
            .await
            .unwrap();

        assert_eq!(artifact.mime.as_deref(), Some("image/png"));
        assert_eq!(artifact.logical_filename, "dog.png");
        assert_eq!(artifact.origin, SourceOrigin::RemoteFetch);
        let name = artifact.local_path.file_name().unwrap().to_string_lossy();
        assert!(name.ends_with(".png"), "scratch name was {name}");
        scope.release().await;
    }

    #[tokio::test]
    async fn dual_fetch_stages_image_and_watermark() {
        let dir = tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path().to_path_buf());
        let mut scope = CleanupScope::new();

        let fetcher = StubFetcher {
            content_type: Some("image/jpeg"),
            body: b"jpeg-bytes".to_vec(),
        };
        let (artifact, watermark_path) = resolver
            .stage_remote_with_watermark(
                "https://example.com/base.jpg",
                "https://example.com/mark.png",
                &fetcher,
                &mut scope,
            )
            .await
            .unwrap();

        assert!(artifact.local_path.exists());
        assert!(watermark_path.exists());
        let name = watermark_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("watermark-") && name.ends_with(".png"));
        assert_eq!(scope.len(), 2);
        scope.release().await;
    }

    #[tokio::test]
    async fn failed_fetch_stages_nothing() {
        let dir = tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path().to_path_buf());
        let mut scope = CleanupScope::new();

        let err = resolver
            .stage_remote("https://example.com/x.png", &FailingFetcher, &mut scope)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AcquisitionFailed(_)));
        assert!(scope.is_empty());
    }

    #[test]
    fn mime_parameters_are_stripped() {
        assert_eq!(strip_mime_params("image/png; charset=binary"), "image/png");
        assert_eq!(strip_mime_params("IMAGE/JPEG"), "image/jpeg");
    }
}
