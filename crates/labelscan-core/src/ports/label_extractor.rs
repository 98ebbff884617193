//! 라벨 필드 추출기 포트.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::extraction::ExtractionOutcome;

/// OCR 텍스트 → 구조화 필드 추출기
///
/// 구현체: `LlmLabelExtractor` (외부 LLM), `RuleLabelExtractor` (로컬 규칙 기반)
///
/// 모델 응답 형식 오류는 에러가 아니라 `ExtractionOutcome::Raw`로 돌려준다.
/// `Err`는 입력 검증 실패나 외부 서비스 실패에만 쓴다.
#[async_trait]
pub trait LabelExtractor: Send + Sync {
    async fn extract(&self, ocr_text: &str) -> Result<ExtractionOutcome, CoreError>;

    /// 추출기 이름 (로그용)
    fn extractor_name(&self) -> &str;
}
