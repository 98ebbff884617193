//! 이미지 소스 포트.
//!
//! `/api/process-ocr`의 `image_url`(원격 URL 또는 업로드된 로컬 경로)을
//! OCR 입력 바이트로 해석한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::image::ImagePayload;

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// 이미지 참조를 읽어 바이트 + 형식 힌트로 반환
    ///
    /// 잘못된 참조는 `CoreError::Validation`/`NotFound`,
    /// 원격 호스트 실패는 `CoreError::Network`로 구분한다.
    async fn load(&self, image_ref: &str) -> Result<ImagePayload, CoreError>;
}
