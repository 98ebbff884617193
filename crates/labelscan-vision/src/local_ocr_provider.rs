//! 로컬 OCR 제공자: Tesseract 래퍼.
//!
//! 전처리와 `TesseractEngine`을 `OcrProvider` 트레이트로 묶는다.
//! `ocr` feature 없이 빌드하면 항상 OCR 에러를 돌려준다.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use labelscan_core::config::LocalOcrConfig;
use labelscan_core::error::CoreError;
use labelscan_core::ports::ocr_provider::OcrProvider;

use crate::preprocess;

// ============================================================
// LocalOcrProvider: Tesseract 래퍼
// ============================================================

/// 로컬 OCR 제공자 (Tesseract 기반)
pub struct LocalOcrProvider {
    /// Tesseract 언어
    language: String,
    /// tessdata 경로
    #[cfg_attr(not(feature = "ocr"), allow(dead_code))]
    tessdata_path: Option<PathBuf>,
}

impl LocalOcrProvider {
    pub fn new(config: &LocalOcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            tessdata_path: config.tessdata_path.clone(),
        }
    }

    /// `ocr` feature 포함 여부
    pub fn is_available() -> bool {
        cfg!(feature = "ocr")
    }

    #[cfg(feature = "ocr")]
    async fn run_engine(&self, gray: image::GrayImage) -> Result<String, CoreError> {
        use crate::ocr::TesseractEngine;

        TesseractEngine::new(self.tessdata_path.clone(), self.language.clone())
            .recognize_async(gray)
            .await
            .map_err(|e| CoreError::OcrError(e.to_string()))
    }

    #[cfg(not(feature = "ocr"))]
    async fn run_engine(&self, _gray: image::GrayImage) -> Result<String, CoreError> {
        Err(CoreError::OcrError(
            "내장 OCR 비활성화 (ocr feature 없이 빌드됨)".to_string(),
        ))
    }
}

#[async_trait]
impl OcrProvider for LocalOcrProvider {
    async fn recognize_text(&self, image: &[u8], image_format: &str) -> Result<String, CoreError> {
        let bytes = image.to_vec();
        let hint = image_format.to_string();
        let gray = tokio::task::spawn_blocking(move || preprocess::prepare(&bytes, &hint))
            .await
            .map_err(|e| CoreError::Internal(format!("전처리 작업 조인 실패: {e}")))?
            .map_err(|e| CoreError::OcrError(e.to_string()))?;

        debug!(
            width = gray.width(),
            height = gray.height(),
            lang = %self.language,
            "로컬 OCR 시작"
        );

        let raw = self.run_engine(gray).await?;
        let text = tidy_lines(&raw);
        if text.is_empty() {
            return Err(CoreError::OcrError("인식된 텍스트 없음".to_string()));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "local-tesseract"
    }

    fn is_external(&self) -> bool {
        false
    }
}

/// Tesseract 출력 정리: 줄 끝 공백 제거, 연속 빈 줄은 하나로
fn tidy_lines(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push("");
            }
        } else {
            out.push(line);
        }
    }
    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn provider() -> LocalOcrProvider {
        LocalOcrProvider::new(&LocalOcrConfig::default())
    }

    #[test]
    fn local_ocr_provider_name() {
        let provider = provider();
        assert_eq!(provider.provider_name(), "local-tesseract");
        assert!(!provider.is_external());
        assert_eq!(provider.language, "deu+eng");
    }

    #[test]
    fn tidy_lines_collapses_blank_runs() {
        let raw = "\n\nErythrozytenkonzentrat   \n\n\n\nBlutgruppe AB Rh neg\n\x0C\n";
        assert_eq!(
            tidy_lines(raw),
            "Erythrozytenkonzentrat\n\nBlutgruppe AB Rh neg"
        );
        assert_eq!(tidy_lines(" \n \n"), "");
    }

    #[tokio::test]
    async fn invalid_image_is_ocr_error() {
        let result = provider().recognize_text(b"fake-image", "png").await;
        assert_matches!(result, Err(CoreError::OcrError(_)));
    }

    #[cfg(not(feature = "ocr"))]
    #[tokio::test]
    async fn disabled_feature_is_ocr_error() {
        use image::{DynamicImage, ImageFormat, RgbImage};
        use std::io::Cursor;

        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(2, 2))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();

        let err = provider()
            .recognize_text(buf.get_ref(), "png")
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::OcrError(ref msg) if msg.contains("ocr feature"));
        assert!(!LocalOcrProvider::is_available());
    }
}
