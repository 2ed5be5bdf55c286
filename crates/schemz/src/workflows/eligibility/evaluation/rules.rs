use super::super::domain::{Profile, Rule, RuleOperator, RuleValue, Scalar};
use super::policy::{loosely_equal, normalize_scalar, normalize_value};

/// Structural problems that make a rule impossible to evaluate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleEvaluationError {
    #[error("operator '{operator}' needs numeric operands, found '{value}'")]
    NonNumericOperand {
        operator: RuleOperator,
        value: String,
    },
    #[error("operator '{operator}' cannot compare against a list")]
    UnexpectedList { operator: RuleOperator },
}

/// Stateless single-rule evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluate one operator against one profile value.
    ///
    /// An absent profile value never matches. Membership against a non-list operand is
    /// `false` rather than an error so one malformed stored rule cannot sink a match pass.
    pub fn evaluate(
        profile_value: Option<&Scalar>,
        operator: RuleOperator,
        rule_value: &RuleValue,
    ) -> Result<bool, RuleEvaluationError> {
        let Some(profile_value) = profile_value else {
            return Ok(false);
        };

        match operator {
            RuleOperator::Eq | RuleOperator::Ne => {
                let expected = single(operator, rule_value)?;
                let equal = loosely_equal(profile_value, expected);
                Ok(if operator == RuleOperator::Eq {
                    equal
                } else {
                    !equal
                })
            }
            RuleOperator::Lt | RuleOperator::Le | RuleOperator::Gt | RuleOperator::Ge => {
                let bound = number(operator, single(operator, rule_value)?)?;
                let actual = number(operator, profile_value)?;
                Ok(match operator {
                    RuleOperator::Lt => actual < bound,
                    RuleOperator::Le => actual <= bound,
                    RuleOperator::Gt => actual > bound,
                    _ => actual >= bound,
                })
            }
            RuleOperator::In | RuleOperator::NotIn => {
                let RuleValue::List(values) = rule_value else {
                    tracing::warn!(
                        operator = %operator,
                        value = %rule_value,
                        "membership rule has a non-list value; treating as no match"
                    );
                    return Ok(false);
                };
                let member = values
                    .iter()
                    .any(|candidate| loosely_equal(profile_value, candidate));
                Ok(if operator == RuleOperator::In {
                    member
                } else {
                    !member
                })
            }
        }
    }

    /// Evaluate `rule` against the matching attribute of `profile`, after field normalisation.
    pub fn evaluate_rule(profile: &Profile, rule: &Rule) -> Result<bool, RuleEvaluationError> {
        let actual = profile
            .attribute(rule.field)
            .map(|value| normalize_scalar(rule.field, value));
        let expected = normalize_value(rule.field, &rule.value);
        Self::evaluate(actual.as_ref(), rule.operator, &expected)
    }
}

fn single(operator: RuleOperator, value: &RuleValue) -> Result<&Scalar, RuleEvaluationError> {
    match value {
        RuleValue::Scalar(scalar) => Ok(scalar),
        RuleValue::List(_) => Err(RuleEvaluationError::UnexpectedList { operator }),
    }
}

fn number(operator: RuleOperator, value: &Scalar) -> Result<f64, RuleEvaluationError> {
    value
        .as_number()
        .ok_or_else(|| RuleEvaluationError::NonNumericOperand {
            operator,
            value: value.to_string(),
        })
}
