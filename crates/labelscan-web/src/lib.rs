//! # labelscan-web
//!
//! 혈액제제 라벨 인식 HTTP 서버.
//! Axum 기반 REST API.
//!
//! ## 엔드포인트
//! - `GET /`: 헬스 체크
//! - `POST /api/upload`: 라벨 이미지 업로드
//! - `POST /api/process-ocr`: OCR + 필드 추출

pub mod error;
pub mod handlers;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use labelscan_core::config::{ServerConfig, UploadConfig};
use labelscan_core::ports::image_source::ImageSource;
use labelscan_core::ports::label_extractor::LabelExtractor;
use labelscan_core::ports::ocr_provider::OcrProvider;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 웹 서버 애플리케이션 상태
///
/// 제공자들은 기동 시 한 번 생성되어 모든 요청이 공유한다.
#[derive(Clone)]
pub struct AppState {
    /// OCR 제공자
    pub ocr: Arc<dyn OcrProvider>,
    /// 필드 추출기
    pub extractor: Arc<dyn LabelExtractor>,
    /// `image_url` 해석기
    pub images: Arc<dyn ImageSource>,
    /// 업로드 저장 디렉토리
    pub upload_dir: PathBuf,
}

/// 라우터 구성 (테스트에서도 사용)
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::root_routes())
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 라벨 인식 HTTP 서버
pub struct WebServer {
    server: ServerConfig,
    upload: UploadConfig,
    state: AppState,
}

impl WebServer {
    /// 새 웹 서버 생성
    pub fn new(
        server: ServerConfig,
        upload: UploadConfig,
        ocr: Arc<dyn OcrProvider>,
        extractor: Arc<dyn LabelExtractor>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        let state = AppState {
            ocr,
            extractor,
            images,
            upload_dir: upload.dir.clone(),
        };
        Self {
            server,
            upload,
            state,
        }
    }

    /// 서버 실행: `shutdown_rx`가 true가 되면 진행 중인 요청을 마치고 종료
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let app = build_router(self.state, self.upload.max_body_bytes);

        let listener = TcpListener::bind(self.server.bind_addr()).await?;
        info!("라벨 인식 서버 시작: http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("웹 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("라벨 인식 서버 종료");
        Ok(())
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://{}", self.server.bind_addr())
    }
}
