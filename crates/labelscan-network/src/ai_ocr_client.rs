//! 외부 AI OCR 클라이언트.
//!
//! 외부 Vision API를 호출하여 라벨 사진의 텍스트를 줄 단위 마크다운으로 받아온다.
//! 내장 Tesseract를 쓸 수 없는 배포 환경용.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use labelscan_core::config::{AiProviderType, ExternalApiEndpoint};
use labelscan_core::error::CoreError;
use labelscan_core::models::image::media_type_for;
use labelscan_core::ports::ocr_provider::OcrProvider;

use crate::status::read_success_body;

/// 모델 미지정 시 기본값
const DEFAULT_OCR_MODEL: &str = "claude-sonnet-4-5-20250929";

/// 전사 응답 최대 토큰 수
const OCR_MAX_TOKENS: u32 = 4096;

/// Vision 모델 지시문
const TRANSCRIBE_PROMPT: &str = "Transcribe all visible text in this image as markdown, \
line by line, preserving table rows. Output only the transcription.";

// ============================================================
// RemoteOcrProvider: 외부 AI OCR API 클라이언트
// ============================================================

/// 외부 AI OCR API 클라이언트
///
/// 지원 API:
/// - Claude Vision (Anthropic): `POST /v1/messages` + image content block
/// - OpenAI 호환 Vision: `POST /chat/completions` + `image_url` data URI
/// - 커스텀 엔드포인트: `{ "image": <base64>, "image_format": ... }` 전송
#[derive(Debug)]
pub struct RemoteOcrProvider {
    /// HTTP 클라이언트
    http_client: reqwest::Client,
    /// API 엔드포인트 URL
    endpoint: String,
    /// API 키 (메모리에만 유지)
    api_key: String,
    /// 모델 이름
    model: String,
    /// AI 제공자 타입: 요청/응답 형식 결정에 사용
    provider_type: AiProviderType,
}

impl RemoteOcrProvider {
    /// 새 RemoteOcrProvider 생성
    pub fn new(config: &ExternalApiEndpoint) -> Result<Self, CoreError> {
        if config.api_key.is_empty() {
            return Err(CoreError::Config(
                "AI OCR API 키 미설정. LABELSCAN__AI_PROVIDER__OCR_API__API_KEY를 지정하세요."
                    .into(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_OCR_MODEL.to_string());

        debug!(
            endpoint = %config.endpoint,
            model = %model,
            timeout = config.timeout_secs,
            "RemoteOcrProvider 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model,
            provider_type: config.provider_type,
        })
    }

    fn build_request_body(&self, encoded: &str, image_format: &str) -> serde_json::Value {
        let media_type = media_type_for(image_format);
        match self.provider_type {
            AiProviderType::Anthropic => serde_json::json!({
                "model": self.model,
                "max_tokens": OCR_MAX_TOKENS,
                "temperature": 0.0,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": media_type,
                                "data": encoded
                            }
                        },
                        { "type": "text", "text": TRANSCRIBE_PROMPT }
                    ]
                }]
            }),
            AiProviderType::OpenAi => serde_json::json!({
                "model": self.model,
                "stream": false,
                "max_tokens": OCR_MAX_TOKENS,
                "temperature": 0.0,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:{};base64,{}", media_type, encoded) }
                        },
                        { "type": "text", "text": TRANSCRIBE_PROMPT }
                    ]
                }]
            }),
            AiProviderType::Generic => serde_json::json!({
                "image": encoded,
                "image_format": image_format
            }),
        }
    }

    /// Claude Vision 응답: content[].text 연결
    fn parse_claude_vision_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::OcrError(format!("응답 JSON 파싱 실패: {}", e)))?;

        let text = response
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Ok(text)
    }

    /// OpenAI 호환 응답: choices[0].message.content
    fn parse_openai_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::OcrError(format!("응답 JSON 파싱 실패: {}", e)))?;

        Ok(response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string())
    }

    /// 범용 응답: `{ "text": ... }` 또는 `{ "results": [{ "text": ... }] }`
    fn parse_generic_response(body: &str) -> Result<String, CoreError> {
        #[derive(Deserialize)]
        struct GenericLine {
            text: String,
        }

        #[derive(Deserialize)]
        struct GenericResponse {
            #[serde(default)]
            text: Option<String>,
            #[serde(default)]
            results: Vec<GenericLine>,
        }

        let response: GenericResponse = serde_json::from_str(body)
            .map_err(|e| CoreError::OcrError(format!("범용 응답 파싱 실패: {}", e)))?;

        Ok(match response.text {
            Some(text) => text,
            None => response
                .results
                .into_iter()
                .map(|line| line.text)
                .collect::<Vec<_>>()
                .join("\n"),
        })
    }
}

#[async_trait]
impl OcrProvider for RemoteOcrProvider {
    async fn recognize_text(&self, image: &[u8], image_format: &str) -> Result<String, CoreError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request_body = self.build_request_body(&encoded, image_format);

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            image_size = image.len(),
            "외부 OCR API 호출"
        );

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body);

        if self.provider_type == AiProviderType::Anthropic {
            builder = builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01");
        } else {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("OCR API 호출 실패: {}", e)))?;

        let body = read_success_body("OCR API", response, CoreError::OcrError).await?;

        let text = match self.provider_type {
            AiProviderType::Anthropic => Self::parse_claude_vision_response(&body)?,
            AiProviderType::OpenAi => Self::parse_openai_response(&body)?,
            AiProviderType::Generic => Self::parse_generic_response(&body)?,
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(CoreError::OcrError("인식된 텍스트 없음".to_string()));
        }

        debug!(chars = text.chars().count(), "외부 OCR 완료");
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "remote-ocr"
    }

    fn is_external(&self) -> bool {
        true
    }
}

// ============================================================
// 테스트
// ============================================================
