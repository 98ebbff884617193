//! 헬스 체크 핸들러.

/// GET /
pub async fn health() -> &'static str {
    "OK"
}
