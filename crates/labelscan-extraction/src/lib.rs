//! # labelscan-extraction
//!
//! OCR 텍스트에서 혈액제제 라벨 필드(제제 종류, 혈액형, Rh 인자, 유효기간)를 추출한다.
//!
//! - [`prompt`]: 고정 추출 규칙과 프롬프트 조립
//! - [`normalize`]: 모델 응답의 코드 펜스 제거 + JSON 해석
//! - [`llm_extractor`]: 외부 LLM 기반 추출기
//! - [`rule_extractor`]: 네트워크 없이 동작하는 규칙 기반 추출기

pub mod llm_extractor;
pub mod normalize;
pub mod prompt;
pub mod rule_extractor;

pub use llm_extractor::LlmLabelExtractor;
pub use normalize::{interpret_model_output, normalize_model_output, strip_code_fence};
pub use rule_extractor::RuleLabelExtractor;
