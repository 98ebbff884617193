//! Tesseract OCR 래퍼.
//!
//! `leptess` 기반. `ocr` feature 활성화 시에만 빌드된다.
//! Tesseract 호출은 블로킹이므로 `spawn_blocking`에서 실행한다.

use std::path::PathBuf;

use image::GrayImage;
use thiserror::Error;
use tracing::debug;

/// 라벨 사진 기준 해상도 (DPI): 미설정 시 Tesseract가 경고를 남긴다
const SOURCE_DPI: i32 = 300;

/// OCR 에러 타입
#[derive(Debug, Error)]
pub enum OcrError {
    /// Tesseract 초기화 실패
    #[error("OCR 초기화 실패: {0}")]
    Init(String),

    /// 이미지 설정 실패
    #[error("OCR 이미지 설정 실패: {0}")]
    ImageSetup(String),

    /// 텍스트 추출 실패
    #[error("OCR 텍스트 추출 실패: {0}")]
    Extraction(String),

    /// 비동기 작업 실패
    #[error("OCR 비동기 작업 실패: {0}")]
    Async(String),
}

/// Tesseract 엔진 설정
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    /// Tesseract 데이터 경로 (None이면 시스템 기본값)
    tessdata_path: Option<PathBuf>,
    /// 언어 (예: "deu+eng")
    language: String,
}

impl TesseractEngine {
    pub fn new(tessdata_path: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            tessdata_path,
            language: language.into(),
        }
    }

    /// 그레이스케일 이미지에서 텍스트 추출 (동기)
    pub fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let (w, h) = (image.width(), image.height());
        let tessdata = self
            .tessdata_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string());

        let mut lt = leptess::LepTess::new(tessdata.as_deref(), &self.language)
            .map_err(|e| OcrError::Init(format!("{e}")))?;

        // 8bit 그레이스케일: 픽셀당 1바이트
        lt.set_image_from_mem(image.as_raw(), w as i32, h as i32, 1, w as i32)
            .map_err(|_| OcrError::ImageSetup("이미지 메모리 설정 실패".to_string()))?;
        lt.set_source_resolution(SOURCE_DPI);

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Extraction(format!("{e}")))?;

        debug!(lang = %self.language, chars = text.chars().count(), "Tesseract 추출 완료");
        Ok(text)
    }

    /// 이미지에서 텍스트 추출 (비동기)
    pub async fn recognize_async(&self, image: GrayImage) -> Result<String, OcrError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.recognize(&image))
            .await
            .map_err(|e| OcrError::Async(format!("작업 조인 실패: {e}")))?
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}
