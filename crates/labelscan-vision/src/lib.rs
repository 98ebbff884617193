//! # labelscan-vision
//!
//! 라벨 사진 전처리와 내장 OCR.
//! 업로드된 이미지를 디코딩·정규화하고, `ocr` feature가 켜져 있으면
//! Tesseract(`leptess`)로 텍스트를 추출한다.

pub mod local_ocr_provider;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod preprocess;
