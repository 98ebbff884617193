//! 추출 프롬프트.
//!
//! 규칙 문구는 모델 지시문으로 그대로 전달되어야 하므로 수정 시 주의.

/// 고정 추출 규칙 (독일 혈액제제 라벨 용어)
pub const EXTRACTION_RULES: &str = r#"product_type: Erythrozyten | Plasma | Thrombozyten
blood_group: check AB first, then A, B, O
rhesus_factor: "+" if Rh positive, "-" if Rh negative
expiration_date: text following "Verwendbar bis" / "Verfall" / near "Exp"
Missing fields → null. Output valid JSON only."#;

/// 응답 JSON 골격: 네 필드 모두 null
pub const RESPONSE_SKELETON: &str = r#"{
  "product_type": null,
  "blood_group": null,
  "rhesus_factor": null,
  "expiration_date": null
}"#;

/// OCR 텍스트 뒤에 붙는 지시문 전체
pub fn extract_prompt() -> String {
    format!(
        "\nExtract structured fields from this German blood product label.\n\nRules:\n{EXTRACTION_RULES}\n\nReturn VALID JSON ONLY:\n{RESPONSE_SKELETON}\n"
    )
}

/// 단일 user 메시지 본문 조립
pub fn build_prompt(ocr_text: &str) -> String {
    format!(
        "I have the following OCR text: {} {}",
        ocr_text,
        extract_prompt()
    )
}
