//! 로컬 규칙 기반 라벨 필드 추출기.
//!
//! LLM 없이도 기본적인 추출이 동작하도록 정규식 매칭을 제공한다.
//! 확실한 표지(Blutgruppe, Rh, Verwendbar bis 등)가 붙은 값만 인정하고
//! 나머지는 null로 둔다.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use labelscan_core::error::CoreError;
use labelscan_core::models::extraction::{
    BloodGroup, ExtractionOutcome, ExtractionResult, ProductType, RhesusFactor,
};
use labelscan_core::ports::label_extractor::LabelExtractor;

/// 혈액형 토큰 alternation: `BloodGroup::MATCH_ORDER` 순서(AB 먼저) + O 대체 표기 0
fn blood_group_alternation() -> String {
    let mut tokens: Vec<&str> = BloodGroup::MATCH_ORDER.iter().map(|g| g.as_str()).collect();
    tokens.push("0");
    tokens.join("|")
}

/// "Blutgruppe: AB", "BG 0", "AB0 A": 표지 뒤의 혈액형
static GROUP_AFTER_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?i:blutgruppe|blood\s+group|bg|ab0|abo)\b[\s:.\-|*]*\b({})\b",
        blood_group_alternation()
    ))
    .unwrap()
});

/// "AB Rh pos", "0 RhD neg": Rh 표지 바로 앞의 혈액형
static GROUP_BEFORE_RH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b({})\b[\s,|*]*(?i:rh)",
        blood_group_alternation()
    ))
    .unwrap()
});

/// Rh 표지: "Rh", "RhD", "Rh-Faktor", "Rhesus", "Rhesusfaktor"
const RH_MARKER: &str = r"\brh(?:esus)?(?:[\s\-]*(?:d\b|faktor\b))?";

/// "Rh pos", "Rh-positiv", "RhD-negativ", "| Rh | pos |"
static RHESUS_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i){RH_MARKER}[\s:|*\-]*(pos|neg)[a-z]*\b")).unwrap()
});

/// "Rh +", "RhD-", "Rh-Faktor: +", "| Rh | - |"
///
/// 부호 뒤에 글자가 오면 ("Rh-Kontrolle") 부호로 보지 않는다.
static RHESUS_SIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){RH_MARKER}[\s:|*]*(\+|-|\x{{2212}})(?:[^\p{{L}}]|$)"
    ))
    .unwrap()
});

/// 유효기간 표지
static EXPIRY_CUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bverwendbar\s+bis\b|\bverfall(?:s?datum)?\b|\bexp(?:iry|iration)?(?:\s+date)?\b\.?",
    )
    .unwrap()
});

/// 표지 뒤 나머지 텍스트를 날짜로 인정할 최소 조건: 연도 또는 월/연도
static PARTIAL_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:19|20)\d{2}\b|\b\d{1,2}[./\-]\d{2,4}\b").unwrap()
});

/// dd.mm.yyyy, dd.mm.yy, dd/mm/yyyy, yyyy-mm-dd
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2}[./]\d{1,2}[./](?:\d{4}|\d{2})|\d{4}-\d{2}-\d{2})\b").unwrap()
});

/// 표지 뒤 남은 텍스트에서 걷어낼 구분 문자 (마크다운 표/강조 포함)
const CUE_TRIM_CHARS: &[char] = &[' ', '\t', ':', '|', '*', '.', '-', '_'];

// ============================================================
// RuleLabelExtractor: 규칙 기반 추출
// ============================================================

/// 로컬 규칙 기반 추출기: 항상 `ExtractionOutcome::Parsed`를 반환한다
pub struct RuleLabelExtractor;

impl RuleLabelExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 동기 추출 (테스트 및 내부용)
    pub fn extract_fields(&self, ocr_text: &str) -> ExtractionResult {
        ExtractionResult {
            product_type: detect_product_type(ocr_text),
            blood_group: detect_blood_group(ocr_text),
            rhesus_factor: detect_rhesus_factor(ocr_text),
            expiration_date: detect_expiration_date(ocr_text),
        }
    }
}

impl Default for RuleLabelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LabelExtractor for RuleLabelExtractor {
    async fn extract(&self, ocr_text: &str) -> Result<ExtractionOutcome, CoreError> {
        if ocr_text.trim().is_empty() {
            return Err(CoreError::validation("ocr_text", "OCR 텍스트가 비어 있음"));
        }
        Ok(ExtractionOutcome::Parsed(self.extract_fields(ocr_text)))
    }

    fn extractor_name(&self) -> &str {
        "local-rule-based"
    }
}

/// 제제 종류: 혈장은 다른 제제의 부유액으로도 표기되므로 마지막에 확인
fn detect_product_type(text: &str) -> Option<ProductType> {
    let lower = text.to_lowercase();
    if lower.contains("erythrozyt") {
        Some(ProductType::Erythrozyten)
    } else if lower.contains("thrombozyt") {
        Some(ProductType::Thrombozyten)
    } else if lower.contains("plasma")
        || lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == "ffp")
    {
        Some(ProductType::Plasma)
    } else {
        None
    }
}

fn detect_blood_group(text: &str) -> Option<BloodGroup> {
    GROUP_AFTER_MARKER_RE
        .captures(text)
        .or_else(|| GROUP_BEFORE_RH_RE.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn detect_rhesus_factor(text: &str) -> Option<RhesusFactor> {
    // 단어 표기를 먼저 본다: "Rh-positiv"의 하이픈은 부호가 아니다
    if let Some(word) = RHESUS_WORD_RE.captures(text).and_then(|c| c.get(1)) {
        return if word.as_str().eq_ignore_ascii_case("pos") {
            Some(RhesusFactor::Positive)
        } else {
            Some(RhesusFactor::Negative)
        };
    }

    let sign = RHESUS_SIGN_RE.captures(text)?.get(1)?.as_str();
    if sign == "+" {
        Some(RhesusFactor::Positive)
    } else {
        Some(RhesusFactor::Negative)
    }
}

/// 표지 뒤 같은 줄의 날짜 → 같은 줄의 날짜 비슷한 나머지 텍스트 → 다음 비어 있지 않은 줄의 날짜 순으로 찾는다
fn detect_expiration_date(text: &str) -> Option<String> {
    for cue in EXPIRY_CUE_RE.find_iter(text) {
        let after = &text[cue.end()..];
        let (line, rest) = match after.find('\n') {
            Some(idx) => (&after[..idx], &after[idx + 1..]),
            None => (after, ""),
        };

        if let Some(date) = DATE_RE.find(line) {
            return Some(date.as_str().to_string());
        }

        let remainder = line.trim_matches(CUE_TRIM_CHARS);
        if PARTIAL_DATE_RE.is_match(remainder) {
            return Some(remainder.to_string());
        }
        // 같은 줄에 다른 값이 있으면 ("EXP | LOT 4711") 다음 줄은 보지 않는다
        if !remainder.is_empty() {
            continue;
        }

        let next_line = rest.lines().map(str::trim).find(|l| !l.is_empty());
        if let Some(date) = next_line.and_then(|l| DATE_RE.find(l)) {
            return Some(date.as_str().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ExtractionResult {
        RuleLabelExtractor::new().extract_fields(text)
    }

    #[test]
    fn rh_pos_is_positive() {
        assert_eq!(
            extract("Blutgruppe A Rh pos").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
        assert_eq!(
            extract("xx Rh pos yy").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
    }

    #[test]
    fn rh_neg_is_negative() {
        assert_eq!(
            extract("0 Rh neg").rhesus_factor,
            Some(RhesusFactor::Negative)
        );
        assert_eq!(
            extract("RhD negativ").rhesus_factor,
            Some(RhesusFactor::Negative)
        );
    }

    #[test]
    fn rhesus_sign_variants() {
        assert_eq!(
            extract("Rh-Faktor: +").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
        assert_eq!(extract("Rh -").rhesus_factor, Some(RhesusFactor::Negative));
        assert_eq!(extract("0 Rh+").rhesus_factor, Some(RhesusFactor::Positive));
        assert_eq!(extract("AB RhD-").rhesus_factor, Some(RhesusFactor::Negative));
        assert_eq!(
            extract("B RhD\u{2212}").rhesus_factor,
            Some(RhesusFactor::Negative)
        );
        assert_eq!(
            extract("Rhesus positiv").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
        assert_eq!(extract("keine Angabe").rhesus_factor, None);
    }

    #[test]
    fn hyphenated_words_keep_their_sign() {
        let positive = [
            "Blutgruppe A Rh-positiv",
            "0 RhD-positiv",
            "AB Rh-pos",
            "Rh-Faktor positiv",
            "Rhesusfaktor: positiv",
        ];
        for text in positive {
            assert_eq!(
                extract(text).rhesus_factor,
                Some(RhesusFactor::Positive),
                "{text}"
            );
        }

        let negative = ["Rh-negativ", "RhD-negativ", "B Rh-neg", "Rh-Faktor negativ"];
        for text in negative {
            assert_eq!(
                extract(text).rhesus_factor,
                Some(RhesusFactor::Negative),
                "{text}"
            );
        }
    }

    #[test]
    fn markdown_table_rhesus() {
        assert_eq!(
            extract("| Rh | pos |").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
        assert_eq!(
            extract("| RhD | negativ |").rhesus_factor,
            Some(RhesusFactor::Negative)
        );
        assert_eq!(
            extract("| Rhesusfaktor | positiv |").rhesus_factor,
            Some(RhesusFactor::Positive)
        );
        assert_eq!(extract("| Rh | + |").rhesus_factor, Some(RhesusFactor::Positive));
        assert_eq!(extract("| Rh | - |").rhesus_factor, Some(RhesusFactor::Negative));

        let row = extract("| Blutgruppe | A | Rh | pos |");
        assert_eq!(row.blood_group, Some(BloodGroup::A));
        assert_eq!(row.rhesus_factor, Some(RhesusFactor::Positive));
    }

    #[test]
    fn rh_marker_without_sign_is_null() {
        assert_eq!(extract("Rh-Faktor").rhesus_factor, None);
        assert_eq!(extract("Rh-Kontrolle durchgeführt").rhesus_factor, None);
        assert_eq!(extract("| Rh | |").rhesus_factor, None);
    }

    #[test]
    fn ab_is_never_split_into_a_or_b() {
        assert_eq!(extract("Blutgruppe AB").blood_group, Some(BloodGroup::AB));
        assert_eq!(extract("BG: AB Rh neg").blood_group, Some(BloodGroup::AB));
        assert_eq!(extract("AB Rh pos").blood_group, Some(BloodGroup::AB));
        assert_eq!(extract("AB0 AB RhD pos").blood_group, Some(BloodGroup::AB));
    }

    #[test]
    fn single_groups_with_markers() {
        assert_eq!(extract("Blutgruppe A").blood_group, Some(BloodGroup::A));
        assert_eq!(extract("B Rh neg").blood_group, Some(BloodGroup::B));
        assert_eq!(extract("0 Rh pos").blood_group, Some(BloodGroup::O));
        assert_eq!(extract("Blutgruppe: O").blood_group, Some(BloodGroup::O));
    }

    #[test]
    fn group_without_marker_is_null() {
        // 표지 없는 단독 대문자는 혈액형으로 인정하지 않는다
        assert_eq!(extract("Charge A 12345").blood_group, None);
        assert_eq!(extract("Blutgruppe AB0").blood_group, None);
    }

    #[test]
    fn lowercase_article_is_not_a_group() {
        assert_eq!(extract("a Rh pos").blood_group, None);
    }

    #[test]
    fn product_types() {
        assert_eq!(
            extract("Erythrozytenkonzentrat leukozytendepletiert in PAGGS-M, Restplasma").product_type,
            Some(ProductType::Erythrozyten)
        );
        assert_eq!(
            extract("Thrombozytenkonzentrat in Plasma").product_type,
            Some(ProductType::Thrombozyten)
        );
        assert_eq!(
            extract("Gefrorenes Frischplasma").product_type,
            Some(ProductType::Plasma)
        );
        assert_eq!(extract("FFP 250 ml").product_type, Some(ProductType::Plasma));
        assert_eq!(extract("Vollblut").product_type, None);
    }

    #[test]
    fn expiration_after_cue_on_same_line() {
        assert_eq!(
            extract("Verwendbar bis: 12.03.2025 23:59").expiration_date.as_deref(),
            Some("12.03.2025")
        );
        assert_eq!(
            extract("Verfalldatum 2025-03-12").expiration_date.as_deref(),
            Some("2025-03-12")
        );
        assert_eq!(
            extract("EXP. 01/04/2025").expiration_date.as_deref(),
            Some("01/04/2025")
        );
    }

    #[test]
    fn expiration_on_next_line() {
        let text = "| Verwendbar bis |\n\n| 31.12.24 |";
        assert_eq!(extract(text).expiration_date.as_deref(), Some("31.12.24"));
    }

    #[test]
    fn expiration_without_date_uses_cue_remainder() {
        assert_eq!(
            extract("Verfall: Ende März 2025").expiration_date.as_deref(),
            Some("Ende März 2025")
        );
    }

    #[test]
    fn expiration_cue_followed_by_other_value_is_null() {
        assert_eq!(extract("EXP | LOT 4711").expiration_date, None);
        assert_eq!(extract("Verfall: siehe Beipackzettel").expiration_date, None);
        assert_eq!(
            extract("EXP | LOT 4711\n31.12.2025").expiration_date,
            None
        );
    }

    #[test]
    fn expiration_remainder_with_month_and_year() {
        assert_eq!(
            extract("Exp: 03/2026 (Monatsende)").expiration_date.as_deref(),
            Some("03/2026 (Monatsende)")
        );
    }

    #[test]
    fn export_is_not_an_expiry_cue() {
        assert_eq!(extract("Export 12.03.2025").expiration_date, None);
    }

    #[test]
    fn full_label() {
        let text = "## Blutspendedienst\n\
                    **Erythrozytenkonzentrat**\n\
                    Blutgruppe AB Rh neg\n\
                    Verwendbar bis: 14.02.2025\n\
                    Charge 4711";
        let result = extract(text);
        assert_eq!(result.product_type, Some(ProductType::Erythrozyten));
        assert_eq!(result.blood_group, Some(BloodGroup::AB));
        assert_eq!(result.rhesus_factor, Some(RhesusFactor::Negative));
        assert_eq!(result.expiration_date.as_deref(), Some("14.02.2025"));
    }

    #[test]
    fn empty_label_is_all_null() {
        assert!(extract("Charge 4711").is_empty());
    }

    #[test]
    fn trait_extract_wraps_result() {
        let extractor = RuleLabelExtractor::new();
        let outcome = tokio_test::block_on(extractor.extract("Plasma 0 Rh pos")).unwrap();
        let result = outcome.parsed().unwrap();
        assert_eq!(result.product_type, Some(ProductType::Plasma));
        assert_eq!(result.blood_group, Some(BloodGroup::O));

        assert!(tokio_test::block_on(extractor.extract("")).is_err());
    }
}
