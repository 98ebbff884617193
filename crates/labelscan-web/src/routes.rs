//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// 루트 라우트 (헬스 체크)
pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::health::health))
}

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 이미지 업로드
        .route("/upload", post(handlers::upload::upload_image))
        // OCR + 필드 추출
        .route("/process-ocr", post(handlers::ocr::process_ocr))
}
