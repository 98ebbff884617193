//! LABELSCAN 핵심 에러 타입.
//!
//! 어댑터는 이 타입을 그대로 반환하고, 웹 계층이 `ApiError`로 변환해 HTTP 상태 코드를 정한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 유효성 검증, 외부 서비스 호출 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Image")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// Rate Limit 초과 (429)
    #[error("요청 한도 초과, {retry_after_secs}초 후 재시도")]
    RateLimit {
        /// 재시도 대기 시간 (초)
        retry_after_secs: u64,
    },

    /// 서비스 일시 불가 (503)
    #[error("서비스 일시 불가: {0}")]
    ServiceUnavailable(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// OCR 처리 실패
    #[error("OCR 에러: {0}")]
    OcrError(String),

    /// 텍스트 생성 API 실패 (오류 응답, 응답 구조 불일치)
    #[error("LLM 에러: {0}")]
    LlmError(String),
}

impl CoreError {
    /// 유효성 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 외부 서비스(OCR/LLM/이미지 호스트) 측 실패인지 여부
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::RateLimit { .. }
                | CoreError::ServiceUnavailable(_)
                | CoreError::OcrError(_)
                | CoreError::LlmError(_)
        )
    }
}
