//! 외부 API 상태 코드 → `CoreError` 매핑.

use labelscan_core::error::CoreError;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use tracing::warn;

/// Retry-After 헤더가 없을 때의 기본 대기 시간 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// 응답 본문 로그/에러 메시지 최대 길이
pub(crate) const BODY_PREVIEW_CHARS: usize = 200;

/// 상태 코드 확인: 성공 응답은 그대로 돌려준다
///
/// 429, 503은 전용 에러로, 그 외 실패는 `on_failure`가 만든 에러로 변환한다.
pub(crate) async fn ensure_success(
    service: &str,
    response: reqwest::Response,
    on_failure: fn(String) -> CoreError,
) -> Result<reqwest::Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    warn!(status = %status, service, "{} 오류 응답", service);
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => CoreError::RateLimit {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        StatusCode::SERVICE_UNAVAILABLE => {
            CoreError::ServiceUnavailable(format!("{service}: {}", preview(&body)))
        }
        _ => on_failure(format!("{service} 오류 ({status}): {}", preview(&body))),
    })
}

/// 성공 응답의 본문 텍스트
pub(crate) async fn read_success_body(
    service: &str,
    response: reqwest::Response,
    on_failure: fn(String) -> CoreError,
) -> Result<String, CoreError> {
    ensure_success(service, response, on_failure)
        .await?
        .text()
        .await
        .map_err(|e| CoreError::Network(format!("{service} 응답 읽기 실패: {e}")))
}

/// 본문 앞부분만 잘라낸 미리보기
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
