//! 혈액제제 라벨 추출 결과 모델.
//!
//! 모델 응답은 표기가 일정하지 않으므로 역직렬화는 관대하게(대소문자, 독일어 표기,
//! `"0"`/`"pos"` 등) 처리하고, 직렬화는 항상 정규 표기로 내보낸다.
//! 인식할 수 없는 값은 추측하지 않고 에러로 돌려 raw 폴백으로 떨어지게 한다.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================
// 필드 enum
// ============================================================

/// 혈액제제 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductType {
    /// 적혈구제제
    Erythrozyten,
    /// 혈장
    Plasma,
    /// 혈소판제제
    Thrombozyten,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Erythrozyten => "Erythrozyten",
            ProductType::Plasma => "Plasma",
            ProductType::Thrombozyten => "Thrombozyten",
        }
    }
}

impl FromStr for ProductType {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        // "Erythrozytenkonzentrat", "Thrombozytenapherese", "Frischplasma" 등 합성어 허용
        if lower.contains("erythrozyt") || lower.contains("erythrocyt") {
            Ok(ProductType::Erythrozyten)
        } else if lower.contains("thrombozyt") || lower.contains("thrombocyt") {
            Ok(ProductType::Thrombozyten)
        } else if lower.contains("plasma") || lower == "ffp" {
            Ok(ProductType::Plasma)
        } else {
            Err(FieldParseError::new("product_type", s))
        }
    }
}

/// ABO 혈액형
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BloodGroup {
    A,
    B,
    AB,
    O,
}

impl BloodGroup {
    /// 텍스트 매칭 순서: "AB"가 "A"/"B"를 포함하므로 AB가 반드시 먼저 온다
    pub const MATCH_ORDER: [BloodGroup; 4] =
        [BloodGroup::AB, BloodGroup::A, BloodGroup::B, BloodGroup::O];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::A => "A",
            BloodGroup::B => "B",
            BloodGroup::AB => "AB",
            BloodGroup::O => "O",
        }
    }
}

impl FromStr for BloodGroup {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "AB" => Ok(BloodGroup::AB),
            "A" => Ok(BloodGroup::A),
            "B" => Ok(BloodGroup::B),
            // 독일 라벨은 O형을 숫자 0으로 표기하는 경우가 많다
            "O" | "0" => Ok(BloodGroup::O),
            _ => Err(FieldParseError::new("blood_group", s)),
        }
    }
}

/// Rh 인자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RhesusFactor {
    /// "+"
    Positive,
    /// "-"
    Negative,
}

impl RhesusFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RhesusFactor::Positive => "+",
            RhesusFactor::Negative => "-",
        }
    }
}

impl FromStr for RhesusFactor {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let bare = lower
            .trim_start_matches("rhesus")
            .trim_start_matches("rhd")
            .trim_start_matches("rh")
            .trim();
        match bare {
            "+" | "pos" | "pos." | "positive" | "positiv" => Ok(RhesusFactor::Positive),
            // U+2212 (수학 기호 마이너스)도 OCR/모델 출력에 종종 섞인다
            "-" | "\u{2212}" | "neg" | "neg." | "negative" | "negativ" => {
                Ok(RhesusFactor::Negative)
            }
            _ => Err(FieldParseError::new("rhesus_factor", s)),
        }
    }
}

macro_rules! canonical_string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

canonical_string_serde!(ProductType);
canonical_string_serde!(BloodGroup);
canonical_string_serde!(RhesusFactor);

/// 필드 값 파싱 실패
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldParseError {
    /// 대상 필드명
    pub field: &'static str,
    /// 인식하지 못한 원본 값
    pub value: String,
}

impl FieldParseError {
    fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: 인식할 수 없는 값 {:?}", self.field, self.value)
    }
}

impl std::error::Error for FieldParseError {}

// ============================================================
// 추출 결과
// ============================================================

/// 라벨에서 추출한 구조화 필드
///
/// 확실하지 않은 필드는 항상 `None`(JSON null)이다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "lenient_field")]
    pub product_type: Option<ProductType>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub rhesus_factor: Option<RhesusFactor>,
    #[serde(default, deserialize_with = "lenient_field")]
    pub expiration_date: Option<String>,
}

impl ExtractionResult {
    /// 모든 필드가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.product_type.is_none()
            && self.blood_group.is_none()
            && self.rhesus_factor.is_none()
            && self.expiration_date.is_none()
    }
}

/// 모델 응답을 JSON으로 해석하지 못했을 때의 대체 응답
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFallback {
    /// 가공하지 않은 모델 응답 원문
    pub raw_response: String,
}

/// 추출 결과: 구조화 성공 또는 원문 폴백
///
/// HTTP 응답 본문으로 그대로 직렬화된다 (untagged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Parsed(ExtractionResult),
    Raw(RawFallback),
}

impl ExtractionOutcome {
    /// 원문 폴백 생성
    pub fn raw(raw_response: impl Into<String>) -> Self {
        ExtractionOutcome::Raw(RawFallback {
            raw_response: raw_response.into(),
        })
    }

    /// 구조화 결과 참조 (폴백이면 None)
    pub fn parsed(&self) -> Option<&ExtractionResult> {
        match self {
            ExtractionOutcome::Parsed(result) => Some(result),
            ExtractionOutcome::Raw(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractionOutcome::Raw(_))
    }
}

impl From<ExtractionResult> for ExtractionOutcome {
    fn from(result: ExtractionResult) -> Self {
        ExtractionOutcome::Parsed(result)
    }
}

/// null, 빈 문자열, "null"/"n/a" 같은 자리표시 문자열은 None으로,
/// 숫자는 문자열로 바꿔 파싱한다 (예: blood_group: 0).
fn lenient_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(de::Error::custom(format!(
                "문자열이 아닌 필드 값: {other}"
            )))
        }
    };

    let trimmed = text.trim();
    if is_placeholder(trimmed) {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(de::Error::custom)
}

fn is_placeholder(value: &str) -> bool {
    value.is_empty()
        || matches!(
            value.to_lowercase().as_str(),
            "null" | "none" | "n/a" | "na" | "unknown" | "unbekannt" | "-/-"
        )
}
