//! 도메인 모델.

pub mod extraction;
pub mod image;
