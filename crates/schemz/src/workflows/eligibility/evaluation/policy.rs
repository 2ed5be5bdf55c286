use super::super::domain::{RuleField, RuleValue, Scalar};

/// Education labels that rule authors (or rule generators) use interchangeably.
const EDUCATION_ALIASES: &[(&str, &str)] = &[("PhD", "Doctorate"), ("Ph.D", "Doctorate")];

/// Loose equality used by `==`, `!=`, `in`, and `not in`.
///
/// * text on either side: compare the canonical text of both sides (`30` equals `"30"`)
/// * otherwise compare numerically, reading booleans as `1`/`0`
pub(crate) fn loosely_equal(left: &Scalar, right: &Scalar) -> bool {
    match (left, right) {
        (Scalar::Text(_), _) | (_, Scalar::Text(_)) => left.to_string() == right.to_string(),
        _ => numeric_reading(left) == numeric_reading(right),
    }
}

fn numeric_reading(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        other => other.as_number(),
    }
}

/// Field-specific canonicalisation applied to both the profile value and the rule operand.
pub(crate) fn normalize_scalar(field: RuleField, value: Scalar) -> Scalar {
    match (field, value) {
        (RuleField::Education, Scalar::Text(text)) => Scalar::Text(education_alias(text)),
        (_, value) => value,
    }
}

pub(crate) fn normalize_value(field: RuleField, value: &RuleValue) -> RuleValue {
    match value {
        RuleValue::Scalar(scalar) => RuleValue::Scalar(normalize_scalar(field, scalar.clone())),
        RuleValue::List(values) => RuleValue::List(
            values
                .iter()
                .cloned()
                .map(|scalar| normalize_scalar(field, scalar))
                .collect(),
        ),
    }
}

fn education_alias(text: String) -> String {
    EDUCATION_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(text.trim()))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(text)
}
