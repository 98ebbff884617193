//! # labelscan-network
//!
//! 외부 HTTP 어댑터.
//! 텍스트 생성 API(OpenAI 호환/Anthropic), Vision OCR API 호출과
//! `image_url` 해석(원격 다운로드, 업로드 디렉토리 내 로컬 파일)을 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use labelscan_network::ai_llm_client::RemoteLlmProvider;
//! use labelscan_network::image_source::ImageSourceResolver;
//!
//! let llm = RemoteLlmProvider::new(&config.ai_provider.llm_api.unwrap())?;
//! let images = ImageSourceResolver::new(&config.upload.dir, config.upload.max_body_bytes)?;
//! ```

pub mod ai_llm_client;
pub mod ai_ocr_client;
pub mod image_source;
mod status;
