//! Weighted rule matching of citizen profiles against the scheme catalog.

pub mod domain;
pub(crate) mod evaluation;
pub mod matching;
pub mod service;

pub use domain::{
    FieldKind, Profile, Rule, RuleError, RuleField, RuleOperator, RuleValue, Scalar,
    DEFAULT_RULE_WEIGHT, MAX_RULE_WEIGHT,
};
pub use evaluation::{MatchOutcome, MatchScorer, RuleEvaluationError, RuleEvaluator};
pub use matching::{MatchingService, SchemeMatch};
pub use service::EligibilityService;
