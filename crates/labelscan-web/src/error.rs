//! API 에러 처리.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use labelscan_core::error::CoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 내부 서버 오류
    #[error("내부 서버 오류: {0}")]
    Internal(String),

    /// 잘못된 요청
    #[error("잘못된 요청: {0}")]
    BadRequest(String),

    /// 외부 OCR/LLM 서비스 실패
    #[error("외부 서비스 오류: {0}")]
    Upstream(String),
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Internal(msg) | ApiError::BadRequest(msg) | ApiError::Upstream(msg) => msg,
        };

        let body = ErrorResponse {
            error: message,
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// 입력 오류는 그대로 노출하고, 외부/내부 오류는 상세를 로그에만 남긴다
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { message, .. } => ApiError::BadRequest(message),
            CoreError::NotFound { resource_type, id } => {
                ApiError::BadRequest(format!("{resource_type}을(를) 찾을 수 없음: {id}"))
            }
            CoreError::OcrError(detail) => {
                warn!(%detail, "OCR 실패");
                ApiError::Upstream(format!("OCR 실패: {detail}"))
            }
            CoreError::RateLimit { retry_after_secs } => {
                warn!(retry_after_secs, "외부 API 요청 한도 초과");
                ApiError::Upstream(format!(
                    "외부 API 요청 한도 초과, {retry_after_secs}초 후 재시도"
                ))
            }
            e if e.is_upstream() => {
                warn!(error = %e, "외부 서비스 호출 실패");
                ApiError::Upstream("외부 서비스 호출 실패".to_string())
            }
            e => {
                error!(error = %e, "요청 처리 중 내부 오류");
                ApiError::Internal("내부 서버 오류".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ApiError::BadRequest("No image provided".to_string());
        assert!(err.to_string().contains("No image provided"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let api: ApiError = CoreError::validation("image_url", "No image URL provided").into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
        assert!(api.to_string().contains("No image URL provided"));
    }

    #[test]
    fn missing_image_maps_to_bad_request() {
        let api: ApiError = CoreError::NotFound {
            resource_type: "image".into(),
            id: "/tmp/x.jpg".into(),
        }
        .into();
        assert_eq!(api.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        for err in [
            CoreError::Network("timeout".into()),
            CoreError::LlmError("500".into()),
            CoreError::OcrError("leer".into()),
            CoreError::ServiceUnavailable("down".into()),
            CoreError::RateLimit {
                retry_after_secs: 3,
            },
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), StatusCode::BAD_GATEWAY);
        }
    }

    #[test]
    fn internal_detail_is_hidden() {
        let api: ApiError = CoreError::Internal("secret path /etc".into()).into();
        assert_eq!(api.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.to_string().contains("/etc"));
    }
}
