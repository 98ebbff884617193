//! 외부 LLM 기반 라벨 필드 추출기.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use labelscan_core::error::CoreError;
use labelscan_core::models::extraction::ExtractionOutcome;
use labelscan_core::ports::label_extractor::LabelExtractor;
use labelscan_core::ports::llm_provider::{CompletionRequest, LlmProvider};

use crate::normalize::interpret_model_output;
use crate::prompt::build_prompt;

/// LLM 기반 추출기
///
/// 요청마다 프롬프트를 새로 만들고 결정적 디코딩(temperature 0.0)으로 한 번 호출한다.
/// 재시도와 캐시는 없다.
pub struct LlmLabelExtractor {
    /// 텍스트 생성 제공자 (기동 시 주입)
    llm: Arc<dyn LlmProvider>,
    /// 최대 출력 토큰 수
    max_tokens: u32,
}

impl LlmLabelExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }
}

#[async_trait]
impl LabelExtractor for LlmLabelExtractor {
    async fn extract(&self, ocr_text: &str) -> Result<ExtractionOutcome, CoreError> {
        if ocr_text.trim().is_empty() {
            return Err(CoreError::validation("ocr_text", "OCR 텍스트가 비어 있음"));
        }

        let request = CompletionRequest::deterministic(build_prompt(ocr_text), self.max_tokens);

        debug!(
            provider = %self.llm.provider_name(),
            ocr_len = ocr_text.len(),
            max_tokens = self.max_tokens,
            "LLM 필드 추출 요청"
        );

        let content = self.llm.complete(&request).await?;
        Ok(interpret_model_output(&content))
    }

    fn extractor_name(&self) -> &str {
        self.llm.provider_name()
    }
}
