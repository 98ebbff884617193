//! 애플리케이션 설정 구조체.
//!
//! 서버 주소, 업로드 저장소, OCR/LLM 제공자, 추출 파라미터 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드
//! ([`crate::config_loader`] 참조).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 업로드 저장소 설정
    #[serde(default)]
    pub upload: UploadConfig,
    /// AI 제공자 설정 (OCR/LLM)
    #[serde(default)]
    pub ai_provider: AiProviderConfig,
    /// 필드 추출 설정
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            upload: UploadConfig::default(),
            ai_provider: AiProviderConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    /// 기동 전 설정 검증: 원격 제공자를 골랐다면 엔드포인트가 있어야 한다
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ai_provider.llm_provider == LlmProviderType::Remote {
            match &self.ai_provider.llm_api {
                None => {
                    return Err(CoreError::Config(
                        "llm_provider=remote 이지만 ai_provider.llm_api 미설정".into(),
                    ))
                }
                Some(api) if api.endpoint.trim().is_empty() => {
                    return Err(CoreError::Config("LLM API endpoint 미설정".into()))
                }
                Some(_) => {}
            }
        }
        if self.ai_provider.ocr_provider == OcrProviderType::Remote {
            match &self.ai_provider.ocr_api {
                None => {
                    return Err(CoreError::Config(
                        "ocr_provider=remote 이지만 ai_provider.ocr_api 미설정".into(),
                    ))
                }
                Some(api) if api.endpoint.trim().is_empty() => {
                    return Err(CoreError::Config("OCR API endpoint 미설정".into()))
                }
                Some(_) => {}
            }
        }
        if self.extraction.max_tokens == 0 {
            return Err(CoreError::validation(
                "extraction.max_tokens",
                "0보다 커야 합니다",
            ));
        }
        Ok(())
    }
}

// ============================================================
// HTTP 서버 설정
// ============================================================

/// HTTP 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 바인드 주소 (기본: 127.0.0.1, 컨테이너 배포 시 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// 포트 (기본: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// "host:port" 형식 바인드 주소
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================
// 업로드 설정
// ============================================================

/// 업로드 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 업로드 이미지 저장 디렉토리: `/api/process-ocr`의 로컬 경로도 이 안으로 제한된다
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,
    /// 요청 본문 최대 크기 (바이트)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============================================================
// AI 제공자 설정
// ============================================================

/// AI 제공자 설정: OCR/LLM 제공자 타입 및 외부 API 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiProviderConfig {
    /// OCR 제공자 타입
    #[serde(default)]
    pub ocr_provider: OcrProviderType,
    /// LLM 제공자 타입
    #[serde(default)]
    pub llm_provider: LlmProviderType,
    /// 외부 OCR API 설정 (ocr_provider=Remote일 때)
    #[serde(default)]
    pub ocr_api: Option<ExternalApiEndpoint>,
    /// 외부 LLM API 설정 (llm_provider=Remote일 때)
    #[serde(default = "default_llm_api")]
    pub llm_api: Option<ExternalApiEndpoint>,
    /// 내장 Tesseract 설정 (ocr_provider=Local일 때)
    #[serde(default)]
    pub local_ocr: LocalOcrConfig,
}

impl Default for AiProviderConfig {
    fn default() -> Self {
        Self {
            ocr_provider: OcrProviderType::default(),
            llm_provider: LlmProviderType::default(),
            ocr_api: None,
            llm_api: default_llm_api(),
            local_ocr: LocalOcrConfig::default(),
        }
    }
}

/// 내장 Tesseract OCR 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalOcrConfig {
    /// Tesseract 언어 (라벨은 독일어 위주)
    #[serde(default = "default_ocr_language")]
    pub language: String,
    /// tessdata 경로 (None이면 시스템 기본값)
    #[serde(default)]
    pub tessdata_path: Option<PathBuf>,
}

impl Default for LocalOcrConfig {
    fn default() -> Self {
        Self {
            language: default_ocr_language(),
            tessdata_path: None,
        }
    }
}

/// OCR 제공자 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrProviderType {
    /// 로컬 Tesseract (기본값)
    #[default]
    Local,
    /// 외부 Vision API
    Remote,
}

/// LLM 제공자 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// 로컬 규칙 기반 추출 (네트워크 불필요)
    Local,
    /// 외부 텍스트 생성 API (기본값)
    #[default]
    Remote,
}

// ============================================================
// AI API 제공자 타입
// ============================================================

/// AI API 제공자 타입: 요청/응답 형식과 인증 헤더를 결정한다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderType {
    /// Anthropic Claude API: `x-api-key` 헤더 + `/v1/messages` 형식
    Anthropic,
    /// OpenAI 호환 API (DeepSeek 포함): `Authorization: Bearer` + `/chat/completions` 형식
    #[default]
    OpenAi,
    /// 기타 제공자: Bearer 토큰, 범용 응답 파싱
    Generic,
}

/// 외부 AI API 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalApiEndpoint {
    /// API URL (예: "https://api.deepseek.com/chat/completions")
    pub endpoint: String,
    /// API 키 (환경변수 주입 권장)
    #[serde(default)]
    pub api_key: String,
    /// 모델 이름 (예: "deepseek-chat")
    #[serde(default)]
    pub model: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
    /// AI 제공자 타입
    #[serde(default)]
    pub provider_type: AiProviderType,
}

impl ExternalApiEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================
// 추출 설정
// ============================================================

/// 필드 추출 설정: temperature는 0.0 고정이라 설정 항목이 없다
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// 최대 출력 토큰 수
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

/// 기본 LLM 엔드포인트 (DeepSeek, OpenAI 호환)
pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";

/// 기본 LLM 모델
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";

fn default_llm_api() -> Option<ExternalApiEndpoint> {
    Some(ExternalApiEndpoint {
        endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
        api_key: String::new(),
        model: Some(DEFAULT_LLM_MODEL.to_string()),
        timeout_secs: default_api_timeout_secs(),
        provider_type: AiProviderType::OpenAi,
    })
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("labelscan-uploads")
}
fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_api_timeout_secs() -> u64 {
    60
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_ocr_language() -> String {
    "deu+eng".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.upload.max_body_bytes, 20 * 1024 * 1024);
        assert_eq!(config.ai_provider.local_ocr.language, "deu+eng");
    }

    #[test]
    fn default_llm_is_deepseek() {
        let config = AppConfig::default_config();
        let api = config.ai_provider.llm_api.unwrap();
        assert_eq!(api.endpoint, DEFAULT_LLM_ENDPOINT);
        assert_eq!(api.model.as_deref(), Some("deepseek-chat"));
        assert_eq!(api.provider_type, AiProviderType::OpenAi);
        assert_eq!(api.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn remote_ocr_without_endpoint_is_invalid() {
        let mut config = AppConfig::default_config();
        config.ai_provider.ocr_provider = OcrProviderType::Remote;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ocr_api"));
    }

    #[test]
    fn remote_llm_without_endpoint_is_invalid() {
        let mut config = AppConfig::default_config();
        config.ai_provider.llm_api = None;
        assert!(config.validate().is_err());

        config.ai_provider.llm_provider = LlmProviderType::Local;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn provider_types_deserialize_lowercase() {
        let parsed: AiProviderConfig = serde_json::from_str(
            r#"{"ocr_provider": "remote", "llm_provider": "local",
                "ocr_api": {"endpoint": "https://ocr.example.com", "provider_type": "anthropic"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.ocr_provider, OcrProviderType::Remote);
        assert_eq!(parsed.llm_provider, LlmProviderType::Local);
        let ocr = parsed.ocr_api.unwrap();
        assert_eq!(ocr.provider_type, AiProviderType::Anthropic);
        assert_eq!(ocr.timeout_secs, 60);
        assert!(ocr.api_key.is_empty());
        // llm_api 생략 시 기본 엔드포인트
        assert!(parsed.llm_api.is_some());
    }

    #[test]
    fn zero_max_tokens_is_invalid() {
        let mut config = AppConfig::default_config();
        config.extraction.max_tokens = 0;
        assert!(config.validate().is_err());
    }
}
