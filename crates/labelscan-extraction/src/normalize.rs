//! 모델 응답 정규화.
//!
//! 모델은 JSON 답을 마크다운 코드 펜스로 감싸 보내기도 한다. 우선순위:
//! 1. ```` ```json ```` 펜스가 있으면 첫 마커 뒤부터 다음 ```` ``` ```` 까지
//! 2. 아니면 아무 ```` ``` ```` 펜스라도 있으면 첫 번째와 두 번째 마커 사이
//! 3. 둘 다 없으면 원문 그대로
//!
//! 닫는 펜스가 없으면 텍스트 끝까지 취한다. 결과는 앞뒤 공백을 제거한다.

use labelscan_core::models::extraction::{ExtractionOutcome, ExtractionResult};
use tracing::{debug, warn};

/// 언어 태그가 붙은 JSON 펜스
pub const JSON_FENCE: &str = "```json";

/// 일반 펜스
pub const FENCE: &str = "```";

/// 코드 펜스 제거 (순수 문자열 변환)
pub fn strip_code_fence(text: &str) -> &str {
    let inner = if let Some(start) = text.find(JSON_FENCE) {
        until_fence(&text[start + JSON_FENCE.len()..])
    } else if let Some(start) = text.find(FENCE) {
        until_fence(&text[start + FENCE.len()..])
    } else {
        text
    };
    inner.trim()
}

fn until_fence(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// 펜스 제거 후 JSON 파싱
pub fn normalize_model_output(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}

/// 모델 응답 → 추출 결과
///
/// JSON이 아니거나, 객체가 아니거나, 필드 값이 스키마에 맞지 않으면
/// 원문을 그대로 담은 폴백을 돌려준다. 이 함수는 실패하지 않는다.
pub fn interpret_model_output(raw: &str) -> ExtractionOutcome {
    let value = match normalize_model_output(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, len = raw.len(), "모델 응답 JSON 파싱 실패, raw 폴백");
            return ExtractionOutcome::raw(raw);
        }
    };

    if !value.is_object() {
        warn!("모델 응답이 JSON 객체가 아님, raw 폴백");
        return ExtractionOutcome::raw(raw);
    }

    match serde_json::from_value::<ExtractionResult>(value) {
        Ok(result) => {
            debug!(
                product_type = ?result.product_type,
                blood_group = ?result.blood_group,
                rhesus_factor = ?result.rhesus_factor,
                expiration_date = ?result.expiration_date,
                "모델 응답 해석 완료"
            );
            ExtractionOutcome::Parsed(result)
        }
        Err(e) => {
            warn!(error = %e, "모델 응답 필드 값 불일치, raw 폴백");
            ExtractionOutcome::raw(raw)
        }
    }
}
