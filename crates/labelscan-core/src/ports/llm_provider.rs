//! LLM 제공자 포트.
//!
//! 단일 턴 텍스트 생성 API를 추상화한다. 요청은 항상 비스트리밍이다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 텍스트 생성 요청 (단일 user 메시지)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// user 메시지 본문
    pub prompt: String,
    /// 최대 출력 토큰 수
    pub max_tokens: u32,
    /// 샘플링 온도 (0.0 = 결정적)
    pub temperature: f32,
}

impl CompletionRequest {
    /// 결정적 디코딩(temperature 0.0) 요청 생성
    pub fn deterministic(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: 0.0,
        }
    }
}

/// LLM 제공자: 프롬프트를 보내고 응답 텍스트를 그대로 돌려준다
///
/// 구현체: `RemoteLlmProvider` (OpenAI 호환 / Anthropic API)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// 응답 본문의 첫 번째 텍스트 블록을 반환 (가공하지 않음)
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CoreError>;

    /// 제공자 이름 (예: "deepseek-chat")
    fn provider_name(&self) -> &str;

    /// 외부 API인지 여부
    fn is_external(&self) -> bool;
}
