//! OCR + 필드 추출 핸들러.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use labelscan_core::models::extraction::ExtractionOutcome;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::AppState;

/// OCR 처리 요청 DTO
#[derive(Debug, Deserialize)]
pub struct ProcessOcrRequest {
    /// 원격 URL 또는 `/api/upload`가 돌려준 경로
    #[serde(default)]
    pub image_url: Option<String>,
}

/// 라벨 이미지 → 구조화 필드
///
/// POST /api/process-ocr
///
/// 모델 응답이 JSON이 아니어도 200으로 `{ "raw_response": ... }`를 돌려준다.
pub async fn process_ocr(
    State(state): State<AppState>,
    payload: Result<Json<ProcessOcrRequest>, JsonRejection>,
) -> Result<Json<ExtractionOutcome>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let image_url = req
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image URL provided".to_string()))?;

    let image = state.images.load(image_url).await?;
    debug!(
        size = image.bytes.len(),
        format = image.format,
        ocr = state.ocr.provider_name(),
        "OCR 시작"
    );

    let ocr_text = state.ocr.recognize_text(&image.bytes, image.format).await?;
    debug!(chars = ocr_text.chars().count(), "OCR 완료");

    let outcome = state.extractor.extract(&ocr_text).await?;
    info!(
        extractor = state.extractor.extractor_name(),
        fallback = outcome.is_fallback(),
        "라벨 필드 추출 완료"
    );

    Ok(Json(outcome))
}
