//! Cell text cleaning rules.
//!
//! Every rule is total on arbitrary input: when no sub-pattern matches it
//! degrades to a best-effort value (the trimmed original for text, a zero
//! for numerics) instead of failing. One malformed cell must never abort
//! extraction of the whole dataset, so nothing in this module returns an
//! error or panics on input text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::FieldValue;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static SIGNED_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+-]?\d+(?:\.\d+)?").expect("static regex"));
static UNSIGNED_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"));
static MAGNITUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*([KkMmBbTt])?").expect("static regex"));

/// Named cleaning rule attached to a field spec.
///
/// The rule doubles as the validity predicate for required fields: a raw
/// cell is valid when the rule's sub-pattern is actually present, not
/// merely when the degraded fallback would apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanRule {
    /// Trimmed text with internal whitespace runs collapsed.
    Text,
    /// Integer with thousands separators stripped ("1,234" -> 1234).
    Integer,
    /// Signed numeric substring ("+2.35" -> 2.35, "-0.5%p" -> -0.5).
    SignedNumber,
    /// Percentage magnitude ("+2.35%" -> 2.35).
    Percent,
    /// Unit-suffixed magnitude ("1.5M" -> 1_500_000).
    UnitMagnitude,
    /// Unsigned decimal ("12.84x" -> 12.84).
    Decimal,
}

impl CleanRule {
    /// Normalize one raw cell. Total: always produces a value.
    pub fn apply(self, raw: &str) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(clean_text(raw)),
            Self::Integer => FieldValue::Integer(clean_integer(raw)),
            Self::SignedNumber => FieldValue::Float(clean_signed_number(raw)),
            Self::Percent => FieldValue::Float(clean_percent(raw)),
            Self::UnitMagnitude => FieldValue::Float(clean_unit_magnitude(raw)),
            Self::Decimal => FieldValue::Float(clean_decimal(raw)),
        }
    }

    /// Validity predicate used for required fields.
    pub fn is_valid(self, raw: &str) -> bool {
        match self {
            Self::Text => !raw.trim().is_empty(),
            Self::Integer => {
                let stripped = strip_separators(raw);
                !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit())
            }
            Self::SignedNumber | Self::Percent => SIGNED_DECIMAL.is_match(raw),
            Self::UnitMagnitude => UNSIGNED_DECIMAL.is_match(raw),
            Self::Decimal => UNSIGNED_DECIMAL.is_match(raw),
        }
    }

    /// Zero/empty sentinel for optional fields that failed the rule.
    pub fn sentinel(self) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(String::new()),
            Self::Integer => FieldValue::Integer(0),
            Self::SignedNumber | Self::Percent | Self::UnitMagnitude | Self::Decimal => {
                FieldValue::Float(0.0)
            }
        }
    }
}

fn clean_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

fn clean_integer(raw: &str) -> i64 {
    let stripped = strip_separators(raw);
    if !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = stripped.parse::<i64>() {
            return value;
        }
    }
    // Best effort: first digit run anywhere in the cell ("₩1,234원" -> 1234).
    DIGIT_RUN
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

fn clean_signed_number(raw: &str) -> f64 {
    let stripped = strip_separators(raw);
    SIGNED_DECIMAL
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn clean_percent(raw: &str) -> f64 {
    // The '%' is presentation, not magnitude: "+2.35%" -> 2.35.
    clean_signed_number(raw)
}

fn clean_unit_magnitude(raw: &str) -> f64 {
    let stripped = strip_separators(raw);
    let Some(captures) = MAGNITUDE.captures(&stripped) else {
        return 0.0;
    };
    let base: f64 = captures
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("K" | "k") => 1e3,
        Some("M" | "m") => 1e6,
        Some("B" | "b") => 1e9,
        Some("T" | "t") => 1e12,
        _ => 1.0,
    };
    base * multiplier
}

fn clean_decimal(raw: &str) -> f64 {
    let stripped = strip_separators(raw);
    UNSIGNED_DECIMAL
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("1,234", 1234)]
    #[case("1,234,567", 1_234_567)]
    #[case(" 1 234 ", 1234)]
    #[case("₩1,234원", 1234)]
    #[case("no digits", 0)]
    #[case("", 0)]
    fn integer_rule_strips_separators(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(CleanRule::Integer.apply(raw), FieldValue::Integer(expected));
    }

    #[rstest]
    #[case("+2.35", 2.35)]
    #[case("-0.50", -0.5)]
    #[case("$+12.40 USD", 12.4)]
    #[case("+1,234.50", 1234.5)]
    #[case("--", 0.0)]
    fn signed_number_rule_extracts_substring(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(
            CleanRule::SignedNumber.apply(raw),
            FieldValue::Float(expected)
        );
    }

    #[rstest]
    #[case("+2.35%", 2.35)]
    #[case("-10.00%", -10.0)]
    #[case("N/A", 0.0)]
    fn percent_rule(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(CleanRule::Percent.apply(raw), FieldValue::Float(expected));
    }

    #[rstest]
    #[case("1.5M", 1_500_000.0)]
    #[case("898K", 898_000.0)]
    #[case("2.1B", 2_100_000_000.0)]
    #[case("3,412", 3412.0)]
    #[case("-", 0.0)]
    fn unit_magnitude_rule(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(
            CleanRule::UnitMagnitude.apply(raw),
            FieldValue::Float(expected)
        );
    }

    #[rstest]
    #[case("12.84", 12.84)]
    #[case("12.84x", 12.84)]
    #[case("N/A", 0.0)]
    fn decimal_rule(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(CleanRule::Decimal.apply(raw), FieldValue::Float(expected));
    }

    #[test]
    fn text_rule_collapses_whitespace() {
        assert_eq!(
            CleanRule::Text.apply("  NVIDIA   Corporation \n"),
            FieldValue::Text("NVIDIA Corporation".into())
        );
    }

    #[test]
    fn integer_validity_matches_all_digit_gate() {
        assert!(CleanRule::Integer.is_valid("1,234"));
        assert!(CleanRule::Integer.is_valid("99"));
        assert!(!CleanRule::Integer.is_valid("1,234원"));
        assert!(!CleanRule::Integer.is_valid("-12"));
        assert!(!CleanRule::Integer.is_valid(""));
    }

    #[test]
    fn text_cleaning_is_idempotent() {
        let once = CleanRule::Text.apply("  a   b  ");
        let twice = CleanRule::Text.apply(once.as_text().unwrap());
        assert_eq!(once, twice);
    }

    const ALL_RULES: [CleanRule; 6] = [
        CleanRule::Text,
        CleanRule::Integer,
        CleanRule::SignedNumber,
        CleanRule::Percent,
        CleanRule::UnitMagnitude,
        CleanRule::Decimal,
    ];

    proptest! {
        // Rules must be total: no panic and a value for every input.
        #[test]
        fn rules_are_total_on_arbitrary_text(raw in "\\PC*") {
            for rule in ALL_RULES {
                let _ = rule.apply(&raw);
                let _ = rule.is_valid(&raw);
            }
        }

        // Re-cleaning an already-cleaned integer must not change it.
        #[test]
        fn integer_cleaning_is_idempotent(raw in "\\PC*") {
            let once = CleanRule::Integer.apply(&raw);
            let rendered = once.to_string();
            prop_assert_eq!(CleanRule::Integer.apply(&rendered), once);
        }
    }
}
