//! OCR 입력 이미지 모델.

use std::path::Path;

/// OCR 제공자에게 넘길 이미지 (원본 바이트 + 형식 힌트)
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// 이미지 바이트
    pub bytes: Vec<u8>,
    /// 이미지 형식 ("png", "jpeg", "webp", "tiff", "bmp")
    pub format: &'static str,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, format: &'static str) -> Self {
        Self { bytes, format }
    }
}

/// 확장자로 이미지 형식 추정: 알 수 없으면 업로드 기본값인 jpeg
pub fn image_format_from_path(path: &str) -> &'static str {
    // URL 쿼리/프래그먼트 제거 후 확장자 확인
    let clean = path.split(['?', '#']).next().unwrap_or(path);
    let ext = Path::new(clean)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "png",
        Some("jpg") | Some("jpeg") => "jpeg",
        Some("webp") => "webp",
        Some("tif") | Some("tiff") => "tiff",
        Some("bmp") => "bmp",
        _ => "jpeg",
    }
}

/// 형식 → MIME 타입
pub fn media_type_for(format: &str) -> &'static str {
    match format {
        "png" => "image/png",
        "jpeg" | "jpg" => "image/jpeg",
        "webp" => "image/webp",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
