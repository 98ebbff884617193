//! 설정 → 어댑터 와이어링.
//!
//! 제공자는 기동 시 한 번만 만들고 `Arc<dyn T>`로 웹 서버 상태에 주입한다.

use std::sync::Arc;

use labelscan_core::config::{AppConfig, LlmProviderType, OcrProviderType, UploadConfig};
use labelscan_core::error::CoreError;
use labelscan_core::ports::image_source::ImageSource;
use labelscan_core::ports::label_extractor::LabelExtractor;
use labelscan_core::ports::ocr_provider::OcrProvider;
use labelscan_extraction::{LlmLabelExtractor, RuleLabelExtractor};
use labelscan_network::ai_llm_client::RemoteLlmProvider;
use labelscan_network::ai_ocr_client::RemoteOcrProvider;
use labelscan_network::image_source::ImageSourceResolver;
use labelscan_vision::local_ocr_provider::LocalOcrProvider;
use tracing::{info, warn};

/// OCR 제공자 생성
pub fn build_ocr_provider(config: &AppConfig) -> Result<Arc<dyn OcrProvider>, CoreError> {
    let ai = &config.ai_provider;
    let provider: Arc<dyn OcrProvider> = match ai.ocr_provider {
        OcrProviderType::Local => {
            if !LocalOcrProvider::is_available() {
                warn!("ocr feature 없이 빌드됨, /api/process-ocr는 OCR 오류를 반환합니다");
            }
            Arc::new(LocalOcrProvider::new(&ai.local_ocr))
        }
        OcrProviderType::Remote => {
            let api = ai
                .ocr_api
                .as_ref()
                .ok_or_else(|| CoreError::Config("ai_provider.ocr_api 미설정".into()))?;
            Arc::new(RemoteOcrProvider::new(api)?)
        }
    };

    info!(provider = provider.provider_name(), external = provider.is_external(), "OCR 제공자");
    Ok(provider)
}

/// 필드 추출기 생성
pub fn build_extractor(config: &AppConfig) -> Result<Arc<dyn LabelExtractor>, CoreError> {
    let ai = &config.ai_provider;
    let extractor: Arc<dyn LabelExtractor> = match ai.llm_provider {
        LlmProviderType::Remote => {
            let api = ai
                .llm_api
                .as_ref()
                .ok_or_else(|| CoreError::Config("ai_provider.llm_api 미설정".into()))?;
            let llm = Arc::new(RemoteLlmProvider::new(api)?);
            Arc::new(LlmLabelExtractor::new(llm, config.extraction.max_tokens))
        }
        LlmProviderType::Local => Arc::new(RuleLabelExtractor::new()),
    };

    info!(extractor = extractor.extractor_name(), "필드 추출기");
    Ok(extractor)
}

/// `image_url` 해석기 생성
pub fn build_image_source(upload: &UploadConfig) -> Result<Arc<dyn ImageSource>, CoreError> {
    Ok(Arc::new(ImageSourceResolver::new(
        upload.dir.clone(),
        upload.max_body_bytes,
    )?))
}
