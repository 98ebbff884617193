//! 이미지 업로드 핸들러.

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// 업로드 파일 필드 이름
pub const IMAGE_FIELD: &str = "image";

/// 확장자를 알 수 없을 때 붙이는 기본값
const DEFAULT_EXTENSION: &str = "jpg";

/// 업로드 응답 DTO
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// 저장된 파일 경로: `/api/process-ocr`의 `image_url`로 그대로 쓸 수 있다
    pub url: String,
    /// 항상 true
    pub success: bool,
}

/// 이미지 업로드
///
/// POST /api/upload (multipart, 필드 `image`)
///
/// 내용/MIME 검증은 하지 않는다. 본문을 끝까지 쓴 뒤에만 파일을 남긴다.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    // multipart 본문이 아니면 이미지가 없는 것과 같다
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e.body_text(), "multipart 본문 아님");
        ApiError::BadRequest("No image provided".to_string())
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let extension = sanitized_extension(field.file_name());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        debug!(size = data.len(), extension = %extension, "업로드 수신");

        let dir = state.upload_dir.clone();
        let path = tokio::task::spawn_blocking(move || persist(&dir, &extension, &data))
            .await
            .map_err(|e| ApiError::Internal(format!("업로드 작업 조인 실패: {e}")))??;

        info!(path = %path.display(), "업로드 저장 완료");
        return Ok(Json(UploadResponse {
            url: path.to_string_lossy().into_owned(),
            success: true,
        }));
    }

    Err(ApiError::BadRequest("No image provided".to_string()))
}

/// 임시 파일에 쓰고 성공 시에만 영구 보존
///
/// 쓰기 중 실패하면 `NamedTempFile`이 drop되며 파일이 삭제된다.
fn persist(dir: &Path, extension: &str, data: &[u8]) -> Result<PathBuf, ApiError> {
    let internal = |e: std::io::Error| {
        tracing::error!(error = %e, dir = %dir.display(), "업로드 저장 실패");
        ApiError::Internal("업로드 저장 실패".to_string())
    };

    std::fs::create_dir_all(dir).map_err(internal)?;

    let mut file = tempfile::Builder::new()
        .prefix("label-")
        .suffix(&format!(".{extension}"))
        .tempfile_in(dir)
        .map_err(internal)?;
    file.write_all(data).map_err(internal)?;
    file.flush().map_err(internal)?;

    let (_, path) = file.keep().map_err(|e| internal(e.error))?;
    Ok(path)
}

/// 원본 파일명의 확장자: 영숫자 1~5자만 허용, 아니면 기본값
fn sanitized_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_file_name() {
        assert_eq!(sanitized_extension(Some("etikett.PNG")), "png");
        assert_eq!(sanitized_extension(Some("scan.jpeg")), "jpeg");
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(sanitized_extension(None), "jpg");
        assert_eq!(sanitized_extension(Some("blob")), "jpg");
        assert_eq!(sanitized_extension(Some("x.tar/../../etc")), "jpg");
        assert_eq!(sanitized_extension(Some("x.verylongext")), "jpg");
    }

    #[test]
    fn persist_keeps_file_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist(dir.path(), "png", b"\x89PNG").unwrap();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
    }

    #[test]
    fn persist_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let path = persist(&nested, "jpg", b"x").unwrap();
        assert!(path.exists());
    }
}
