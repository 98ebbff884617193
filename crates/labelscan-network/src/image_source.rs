//! 이미지 참조 해석기.
//!
//! `http(s)://` URL은 내려받고, 그 외는 업로드 디렉토리 안의 로컬 경로로 취급한다.
//! 로컬 경로는 정규화한 뒤 업로드 디렉토리 밖이면 거부한다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use labelscan_core::error::CoreError;
use labelscan_core::models::image::{image_format_from_path, ImagePayload};
use labelscan_core::ports::image_source::ImageSource;

use crate::status::ensure_success;

/// 원격 이미지 다운로드 타임아웃
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// 이미지 참조 해석기: 원격 URL 또는 업로드 디렉토리 내 파일
#[derive(Debug)]
pub struct ImageSourceResolver {
    http_client: reqwest::Client,
    upload_dir: PathBuf,
    /// 이미지 최대 크기 (바이트)
    max_bytes: usize,
}

impl ImageSourceResolver {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, CoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            http_client,
            upload_dir: upload_dir.into(),
            max_bytes,
        })
    }

    async fn fetch_remote(&self, url: &Url) -> Result<ImagePayload, CoreError> {
        debug!(url = %url, "원격 이미지 다운로드");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("이미지 다운로드 실패: {}", e)))?;

        let mut response = ensure_success("이미지 호스트", response, CoreError::Network).await?;
        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        // Content-Length 없는 chunked 응답도 한도를 넘는 즉시 중단
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CoreError::Network(format!("이미지 호스트 응답 읽기 실패: {}", e)))?
        {
            bytes.extend_from_slice(&chunk);
            self.check_size(bytes.len())?;
        }

        Ok(ImagePayload::new(bytes, image_format_from_path(url.path())))
    }

    async fn read_local(&self, path: &Path) -> Result<ImagePayload, CoreError> {
        let resolved = match tokio::fs::canonicalize(path).await {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::NotFound {
                    resource_type: "image".to_string(),
                    id: path.display().to_string(),
                });
            }
            Err(e) => return Err(CoreError::Io(e)),
        };

        let root = tokio::fs::canonicalize(&self.upload_dir).await.map_err(|e| {
            CoreError::Internal(format!(
                "업로드 디렉토리 확인 실패 ({}): {}",
                self.upload_dir.display(),
                e
            ))
        })?;

        if !resolved.starts_with(&root) {
            return Err(CoreError::validation(
                "image_url",
                "업로드 디렉토리 밖의 경로는 허용되지 않습니다",
            ));
        }

        let metadata = tokio::fs::metadata(&resolved).await?;
        if !metadata.is_file() {
            return Err(CoreError::validation("image_url", "파일이 아닙니다"));
        }
        self.check_size(metadata.len() as usize)?;

        let bytes = tokio::fs::read(&resolved).await?;
        let format = image_format_from_path(&resolved.to_string_lossy());

        debug!(path = %resolved.display(), size = bytes.len(), format, "로컬 이미지 읽기");
        Ok(ImagePayload::new(bytes, format))
    }

    fn check_size(&self, len: usize) -> Result<(), CoreError> {
        if len > self.max_bytes {
            return Err(CoreError::validation(
                "image_url",
                format!("이미지가 너무 큽니다 ({} > {} 바이트)", len, self.max_bytes),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageSource for ImageSourceResolver {
    async fn load(&self, image_ref: &str) -> Result<ImagePayload, CoreError> {
        let image_ref = image_ref.trim();
        if image_ref.is_empty() {
            return Err(CoreError::validation("image_url", "비어 있음"));
        }

        match Url::parse(image_ref) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch_remote(&url).await,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| CoreError::validation("image_url", "잘못된 file URL"))?;
                self.read_local(&path).await
            }
            // 한 글자 스킴은 Windows 드라이브 문자 ("C:\...")
            Ok(url) if url.scheme().len() > 1 => Err(CoreError::validation(
                "image_url",
                format!("지원하지 않는 스킴: {}", url.scheme()),
            )),
            _ => self.read_local(Path::new(image_ref)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const MAX: usize = 1024;

    #[tokio::test]
    async fn reads_file_inside_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let payload = resolver.load(path.to_str().unwrap()).await.unwrap();

        assert_eq!(payload.bytes, b"\x89PNG");
        assert_eq!(payload.format, "png");
    }

    #[tokio::test]
    async fn file_url_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.jpg");
        std::fs::write(&path, b"jpg").unwrap();

        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let payload = resolver.load(url.as_str()).await.unwrap();

        assert_eq!(payload.format, "jpeg");
    }

    #[tokio::test]
    async fn rejects_path_outside_upload_dir() {
        let uploads = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let secret = other.path().join("secret.png");
        std::fs::write(&secret, b"x").unwrap();

        let resolver = ImageSourceResolver::new(uploads.path(), MAX).unwrap();
        let err = resolver.load(secret.to_str().unwrap()).await.unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });

        let traversal = uploads
            .path()
            .join("..")
            .join(other.path().file_name().unwrap())
            .join("secret.png");
        let err = resolver.load(traversal.to_str().unwrap()).await.unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let missing = dir.path().join("nope.jpg");

        let err = resolver.load(missing.to_str().unwrap()).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { .. });
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        std::fs::write(&path, vec![0u8; MAX + 1]).unwrap();

        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let err = resolver.load(path.to_str().unwrap()).await.unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }

    #[tokio::test]
    async fn unsupported_scheme_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();

        let err = resolver.load("ftp://example.com/a.png").await.unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
        let err = resolver.load("   ").await.unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }

    #[tokio::test]
    async fn fetches_remote_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/labels/scan.webp")
            .with_status(200)
            .with_body(b"RIFF")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let payload = resolver
            .load(&format!("{}/labels/scan.webp", server.url()))
            .await
            .unwrap();

        assert_eq!(payload.bytes, b"RIFF");
        assert_eq!(payload.format, "webp");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn remote_404_is_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let err = resolver
            .load(&format!("{}/missing.jpg", server.url()))
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Network(_));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn oversized_remote_image_is_rejected_by_length() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.jpg")
            .with_status(200)
            .with_body(vec![0u8; MAX + 1])
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let err = resolver
            .load(&format!("{}/big.jpg", server.url()))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }

    #[tokio::test]
    async fn oversized_chunked_image_is_rejected() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stream.jpg")
            .with_status(200)
            .with_chunked_body(|w| {
                for _ in 0..4 {
                    w.write_all(&[0u8; MAX / 2])?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageSourceResolver::new(dir.path(), MAX).unwrap();
        let err = resolver
            .load(&format!("{}/stream.jpg", server.url()))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation { .. });
    }
}
