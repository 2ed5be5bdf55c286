use std::fmt;

use serde::{Deserialize, Serialize};

/// Profile attributes a rule can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Age,
    Income,
    Category,
    Education,
    State,
    Gender,
    MaritalStatus,
    Disability,
    Occupation,
}

impl RuleField {
    pub const ALL: [RuleField; 9] = [
        RuleField::Age,
        RuleField::Income,
        RuleField::Category,
        RuleField::Education,
        RuleField::State,
        RuleField::Gender,
        RuleField::MaritalStatus,
        RuleField::Disability,
        RuleField::Occupation,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RuleField::Age => "age",
            RuleField::Income => "income",
            RuleField::Category => "category",
            RuleField::Education => "education",
            RuleField::State => "state",
            RuleField::Gender => "gender",
            RuleField::MaritalStatus => "marital_status",
            RuleField::Disability => "disability",
            RuleField::Occupation => "occupation",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            RuleField::Age | RuleField::Income => FieldKind::Numeric,
            RuleField::Disability => FieldKind::Boolean,
            RuleField::Category
            | RuleField::Education
            | RuleField::State
            | RuleField::Gender
            | RuleField::MaritalStatus
            | RuleField::Occupation => FieldKind::Categorical,
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Declared type of a rule field, deciding which operators and values are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
    Boolean,
}

impl FieldKind {
    pub fn accepts(self, operator: RuleOperator) -> bool {
        match self {
            FieldKind::Numeric => true,
            FieldKind::Categorical => !operator.is_comparison(),
            FieldKind::Boolean => matches!(operator, RuleOperator::Eq | RuleOperator::Ne),
        }
    }

    fn accepts_scalar(self, value: &Scalar) -> bool {
        match self {
            FieldKind::Numeric => value.as_number().is_some(),
            FieldKind::Categorical => matches!(value, Scalar::Text(text) if !text.trim().is_empty()),
            FieldKind::Boolean => matches!(value, Scalar::Bool(_)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FieldKind::Numeric => "numeric",
            FieldKind::Categorical => "categorical",
            FieldKind::Boolean => "boolean",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

impl RuleOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            RuleOperator::Eq => "==",
            RuleOperator::Ne => "!=",
            RuleOperator::Lt => "<",
            RuleOperator::Le => "<=",
            RuleOperator::Gt => ">",
            RuleOperator::Ge => ">=",
            RuleOperator::In => "in",
            RuleOperator::NotIn => "not in",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            RuleOperator::Lt | RuleOperator::Le | RuleOperator::Gt | RuleOperator::Ge
        )
    }

    pub const fn is_membership(self) -> bool {
        matches!(self, RuleOperator::In | RuleOperator::NotIn)
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Single rule or profile value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    /// Numeric reading of the value: numbers as-is and numeric text parsed. Booleans have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(value) if value.is_finite() => Some(*value),
            Scalar::Number(_) | Scalar::Bool(_) => None,
            Scalar::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Scalar::Number(value) => write!(f, "{value}"),
            Scalar::Bool(value) => write!(f, "{value}"),
            Scalar::Text(text) => f.write_str(text),
        }
    }
}

/// Rule operand: one value for equality and comparison, a list for membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    List(Vec<Scalar>),
    Scalar(Scalar),
}

impl RuleValue {
    pub fn number(value: f64) -> Self {
        RuleValue::Scalar(Scalar::Number(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        RuleValue::Scalar(Scalar::Text(value.into()))
    }

    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleValue::List(values.into_iter().map(|v| Scalar::Text(v.into())).collect())
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Scalar(value) => write!(f, "{value}"),
            RuleValue::List(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

pub const DEFAULT_RULE_WEIGHT: u8 = 10;
pub const MAX_RULE_WEIGHT: u8 = 100;

fn default_weight() -> u8 {
    DEFAULT_RULE_WEIGHT
}

/// One weighted eligibility criterion.
///
/// Stored rules deserialize without checks so legacy documents still load; every authoring
/// path goes through [`Rule::new`] or [`Rule::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: RuleField,
    pub operator: RuleOperator,
    pub value: RuleValue,
    #[serde(default = "default_weight")]
    pub weight: u8,
}

impl Rule {
    pub fn new(
        field: RuleField,
        operator: RuleOperator,
        value: RuleValue,
        weight: u8,
    ) -> Result<Self, RuleError> {
        Self {
            field,
            operator,
            value,
            weight,
        }
        .validated()
    }

    /// Check weight range and operator/value compatibility with the field's declared kind.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.weight == 0 || self.weight > MAX_RULE_WEIGHT {
            return Err(RuleError::WeightOutOfRange {
                field: self.field,
                weight: self.weight,
            });
        }

        let kind = self.field.kind();
        if !kind.accepts(self.operator) {
            return Err(RuleError::IncompatibleOperator {
                field: self.field,
                kind,
                operator: self.operator,
            });
        }

        match (&self.value, self.operator.is_membership()) {
            (RuleValue::List(values), true) => {
                if values.is_empty() {
                    return Err(RuleError::EmptyList {
                        field: self.field,
                        operator: self.operator,
                    });
                }
                if let Some(bad) = values.iter().find(|value| !kind.accepts_scalar(value)) {
                    return Err(RuleError::ValueKindMismatch {
                        field: self.field,
                        kind,
                        value: bad.to_string(),
                    });
                }
                Ok(())
            }
            (RuleValue::Scalar(_), true) => Err(RuleError::ExpectedList {
                field: self.field,
                operator: self.operator,
            }),
            (RuleValue::List(_), false) => Err(RuleError::ExpectedScalar {
                field: self.field,
                operator: self.operator,
            }),
            (RuleValue::Scalar(value), false) => {
                if kind.accepts_scalar(value) {
                    Ok(())
                } else {
                    Err(RuleError::ValueKindMismatch {
                        field: self.field,
                        kind,
                        value: value.to_string(),
                    })
                }
            }
        }
    }

    /// Validate and rewrite numeric text on numeric fields (`"30"`) into numbers.
    pub fn validated(mut self) -> Result<Self, RuleError> {
        self.validate()?;
        if self.field.kind() == FieldKind::Numeric {
            self.value = match self.value {
                RuleValue::Scalar(value) => RuleValue::Scalar(numeric(value)),
                RuleValue::List(values) => {
                    RuleValue::List(values.into_iter().map(numeric).collect())
                }
            };
        }
        Ok(self)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} {} (weight {})",
            self.field, self.operator, self.value, self.weight
        )
    }
}

fn numeric(value: Scalar) -> Scalar {
    match value.as_number() {
        Some(number) => Scalar::Number(number),
        None => value,
    }
}

/// Rejections raised while constructing or validating a rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("rule on '{field}' has weight {weight}; weights must be between 1 and 100")]
    WeightOutOfRange { field: RuleField, weight: u8 },
    #[error("operator '{operator}' is not allowed on {kind} field '{field}'")]
    IncompatibleOperator {
        field: RuleField,
        kind: FieldKind,
        operator: RuleOperator,
    },
    #[error("operator '{operator}' on '{field}' requires a list of values")]
    ExpectedList {
        field: RuleField,
        operator: RuleOperator,
    },
    #[error("operator '{operator}' on '{field}' requires a single value, not a list")]
    ExpectedScalar {
        field: RuleField,
        operator: RuleOperator,
    },
    #[error("operator '{operator}' on '{field}' requires at least one value")]
    EmptyList {
        field: RuleField,
        operator: RuleOperator,
    },
    #[error("value '{value}' is not a valid {kind} value for '{field}'")]
    ValueKindMismatch {
        field: RuleField,
        kind: FieldKind,
        value: String,
    },
}

/// Citizen attributes read from the profile store for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub age: Option<u32>,
    pub income: Option<f64>,
    pub category: Option<String>,
    pub education: Option<String>,
    pub state: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    /// Disability kind as recorded on the profile (`None`, `Physical`, `Visual`, ...).
    pub disability: Option<String>,
    pub occupation: Option<String>,
}

impl Profile {
    /// Value presented to rules on `field`. Disability is exposed as "has a disability".
    pub fn attribute(&self, field: RuleField) -> Option<Scalar> {
        match field {
            RuleField::Age => self.age.map(|age| Scalar::Number(f64::from(age))),
            RuleField::Income => self.income.map(Scalar::Number),
            RuleField::Category => self.category.clone().map(Scalar::Text),
            RuleField::Education => self.education.clone().map(Scalar::Text),
            RuleField::State => self.state.clone().map(Scalar::Text),
            RuleField::Gender => self.gender.clone().map(Scalar::Text),
            RuleField::MaritalStatus => self.marital_status.clone().map(Scalar::Text),
            RuleField::Disability => self.disability.as_deref().map(|kind| {
                let kind = kind.trim();
                Scalar::Bool(!kind.is_empty() && !kind.eq_ignore_ascii_case("none"))
            }),
            RuleField::Occupation => self.occupation.clone().map(Scalar::Text),
        }
    }
}
