//! OCR 제공자 포트.
//!
//! 내장 Tesseract 또는 외부 Vision API를 추상화하는 인터페이스를 정의한다.

use async_trait::async_trait;

use crate::error::CoreError;

/// OCR 제공자: 내장(Tesseract) 또는 외부 AI API
///
/// 구현체: `LocalOcrProvider` (Tesseract), `RemoteOcrProvider` (Vision API)
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// 이미지에서 텍스트 추출 (줄 단위 마크다운 문자열)
    ///
    /// - `image`: 이미지 바이트
    /// - `image_format`: 이미지 형식 ("png", "jpeg" 등)
    ///
    /// 인식된 텍스트가 없으면 `CoreError::OcrError`를 반환한다.
    async fn recognize_text(&self, image: &[u8], image_format: &str)
        -> Result<String, CoreError>;

    /// 제공자 이름 (예: "local-tesseract", "remote-ocr")
    fn provider_name(&self) -> &str;

    /// 외부 API인지 여부
    fn is_external(&self) -> bool;
}
