//! 외부 AI LLM 클라이언트.
//!
//! 텍스트 생성 API(DeepSeek 등 OpenAI 호환, Anthropic)를 호출하여
//! 라벨 필드 추출 프롬프트의 응답 텍스트를 받아온다.
//! 응답 텍스트는 가공하지 않고 그대로 돌려주며, 코드 펜스 제거와 JSON 해석은
//! `labelscan-extraction`이 담당한다.

use async_trait::async_trait;
use tracing::debug;

use labelscan_core::config::{AiProviderType, ExternalApiEndpoint, DEFAULT_LLM_MODEL};
use labelscan_core::error::CoreError;
use labelscan_core::ports::llm_provider::{CompletionRequest, LlmProvider};

use crate::status::read_success_body;

// ============================================================
// RemoteLlmProvider: 외부 AI LLM 클라이언트
// ============================================================

/// 외부 AI LLM 클라이언트
///
/// 지원 API:
/// - OpenAI 호환 (DeepSeek 포함): `POST /chat/completions`
/// - Claude (Anthropic): `POST /v1/messages`
/// - 커스텀 엔드포인트 (OpenAI 형식 요청, 범용 응답 파싱)
///
/// 프로세스 기동 시 한 번 생성하여 `Arc`로 공유한다.
#[derive(Debug)]
pub struct RemoteLlmProvider {
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

impl RemoteLlmProvider {
    /// 새 RemoteLlmProvider 생성
    pub fn new(config: &ExternalApiEndpoint) -> Result<Self, CoreError> {
        if config.api_key.is_empty() {
            return Err(CoreError::Config(
                "AI LLM API 키 미설정. DEEPSEEK_API_KEY 또는 LABELSCAN__AI_PROVIDER__LLM_API__API_KEY를 지정하세요."
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
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        debug!(
            endpoint = %config.endpoint,
            model = %model,
            timeout = config.timeout_secs,
            provider = ?config.provider_type,
            "RemoteLlmProvider 초기화"
        );

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model,
            provider_type: config.provider_type,
        })
    }

    /// 요청 본문 구성: 단일 user 메시지, 비스트리밍
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        match self.provider_type {
            AiProviderType::Anthropic => serde_json::json!({
                "model": self.model,
                "max_tokens": request.max_tokens,
                "temperature": request.temperature,
                "messages": [{
                    "role": "user",
                    "content": request.prompt
                }]
            }),
            AiProviderType::OpenAi | AiProviderType::Generic => serde_json::json!({
                "model": self.model,
                "messages": [{
                    "role": "user",
                    "content": request.prompt
                }],
                "stream": false,
                "max_tokens": request.max_tokens,
                "temperature": request.temperature
            }),
        }
    }

    /// Claude API 응답 파싱: content[0].text
    fn parse_claude_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::LlmError(format!("LLM 응답 JSON 파싱 실패: {}", e)))?;

        response
            .get("content")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.iter().find_map(|block| block.get("text")))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| CoreError::LlmError("LLM 응답에서 텍스트를 찾을 수 없음".to_string()))
    }

    /// OpenAI 호환 응답 파싱: choices[0].message.content
    fn parse_openai_response(body: &str) -> Result<String, CoreError> {
        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::LlmError(format!("LLM 응답 JSON 파싱 실패: {}", e)))?;

        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CoreError::LlmError("OpenAI 응답에서 텍스트를 찾을 수 없음".to_string())
            })
    }

    /// 범용 응답 파싱: OpenAI 형식 우선, 없으면 최상위 "text"/"response"
    fn parse_generic_response(body: &str) -> Result<String, CoreError> {
        if let Ok(text) = Self::parse_openai_response(body) {
            return Ok(text);
        }

        let response: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| CoreError::LlmError(format!("LLM 응답 JSON 파싱 실패: {}", e)))?;

        ["text", "response", "output"]
            .iter()
            .find_map(|key| response.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .ok_or_else(|| CoreError::LlmError("범용 응답에서 텍스트를 찾을 수 없음".to_string()))
    }
}

#[async_trait]
impl LlmProvider for RemoteLlmProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CoreError> {
        let request_body = self.build_request_body(request);

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_len = request.prompt.len(),
            "외부 LLM API 호출"
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
            .map_err(|e| CoreError::Network(format!("LLM API 호출 실패: {}", e)))?;

        let body = read_success_body("LLM API", response, CoreError::LlmError).await?;

        let content = match self.provider_type {
            AiProviderType::Anthropic => Self::parse_claude_response(&body)?,
            AiProviderType::OpenAi => Self::parse_openai_response(&body)?,
            AiProviderType::Generic => Self::parse_generic_response(&body)?,
        };

        debug!(len = content.len(), "LLM 응답 수신");
        Ok(content)
    }

    fn provider_name(&self) -> &str {
        &self.model
    }

    fn is_external(&self) -> bool {
        true
    }
}

// ============================================================
// 테스트
// ============================================================
