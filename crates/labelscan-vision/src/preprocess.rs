//! OCR 입력 전처리.
//!
//! 업로드 이미지를 디코딩하고 Tesseract가 읽기 좋은 그레이스케일로 변환한다.
//! 휴대폰으로 찍은 작은 라벨 사진은 짧은 변 기준으로 확대한다.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};
use thiserror::Error;
use tracing::debug;

/// 확대 기준 짧은 변 길이 (px)
pub const MIN_SHORT_SIDE: u32 = 1000;

/// 최대 확대 배율
pub const MAX_UPSCALE: u32 = 3;

/// 전처리 에러
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// 디코딩 실패
    #[error("이미지 디코딩 실패: {0}")]
    Decode(String),

    /// 빈 이미지 입력
    #[error("빈 이미지: 너비 또는 높이가 0")]
    EmptyImage,
}

/// 바이트 → 이미지
///
/// 내용으로 형식을 먼저 추정하고, 실패하면 확장자 힌트를 쓴다.
pub fn decode(bytes: &[u8], format_hint: &str) -> Result<DynamicImage, PreprocessError> {
    if bytes.is_empty() {
        return Err(PreprocessError::EmptyImage);
    }

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    let reader = match reader.format() {
        Some(_) => reader,
        None => {
            let format = ImageFormat::from_extension(format_hint)
                .ok_or_else(|| PreprocessError::Decode(format!("알 수 없는 형식: {format_hint}")))?;
            let mut reader = ImageReader::new(Cursor::new(bytes));
            reader.set_format(format);
            reader
        }
    };

    let img = reader
        .decode()
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }
    Ok(img)
}

/// 짧은 변이 `MIN_SHORT_SIDE`보다 작으면 정수 배율로 확대 (최대 `MAX_UPSCALE`)
pub fn upscale_factor(width: u32, height: u32) -> u32 {
    let short = width.min(height).max(1);
    if short >= MIN_SHORT_SIDE {
        1
    } else {
        MIN_SHORT_SIDE.div_ceil(short).min(MAX_UPSCALE)
    }
}

/// 그레이스케일 변환 + 필요 시 확대
pub fn to_ocr_gray(img: &DynamicImage) -> GrayImage {
    let gray = img.to_luma8();
    let factor = upscale_factor(gray.width(), gray.height());
    if factor == 1 {
        return gray;
    }

    debug!(
        "OCR 전처리 확대: {}x{} → x{}",
        gray.width(),
        gray.height(),
        factor
    );
    image::imageops::resize(
        &gray,
        gray.width() * factor,
        gray.height() * factor,
        FilterType::CatmullRom,
    )
}

/// 디코딩 + 그레이스케일 변환
pub fn prepare(bytes: &[u8], format_hint: &str) -> Result<GrayImage, PreprocessError> {
    let img = decode(bytes, format_hint)?;
    Ok(to_ocr_gray(&img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 10, 10])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn decode_png() {
        let img = decode(&png_bytes(4, 3), "jpeg").unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn decode_garbage_fails() {
        assert_matches!(decode(b"fake-image", "png"), Err(PreprocessError::Decode(_)));
        assert_matches!(decode(b"", "png"), Err(PreprocessError::EmptyImage));
    }

    #[test]
    fn upscale_factor_bounds() {
        assert_eq!(upscale_factor(2000, 1500), 1);
        assert_eq!(upscale_factor(1000, 4000), 1);
        assert_eq!(upscale_factor(800, 600), 2);
        assert_eq!(upscale_factor(100, 100), MAX_UPSCALE);
        assert_eq!(upscale_factor(0, 0), MAX_UPSCALE);
    }

    #[test]
    fn prepare_converts_and_upscales() {
        let gray = prepare(&png_bytes(10, 8), "png").unwrap();
        assert_eq!((gray.width(), gray.height()), (30, 24));
    }
}
