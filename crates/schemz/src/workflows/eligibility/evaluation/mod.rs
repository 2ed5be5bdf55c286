mod policy;
mod rules;

pub use rules::{RuleEvaluationError, RuleEvaluator};

use serde::{Deserialize, Serialize};

use super::domain::{Profile, Rule};

/// Weighted score of one profile against one rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub percentage: u8,
    pub matched_weight: u32,
    pub total_weight: u32,
    /// Rules that held, in the scheme's own order.
    pub matched_rules: Vec<Rule>,
}

/// Stateless scorer that aggregates rule results into a match percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchScorer;

impl MatchScorer {
    pub fn score(profile: &Profile, rules: &[Rule]) -> Result<MatchOutcome, RuleEvaluationError> {
        let mut total_weight: u32 = 0;
        let mut matched_weight: u32 = 0;
        let mut matched_rules = Vec::new();

        for rule in rules {
            let weight = u32::from(rule.weight);
            total_weight += weight;
            if RuleEvaluator::evaluate_rule(profile, rule)? {
                matched_weight += weight;
                matched_rules.push(rule.clone());
            }
        }

        Ok(MatchOutcome {
            percentage: percentage(matched_weight, total_weight),
            matched_weight,
            total_weight,
            matched_rules,
        })
    }
}

/// `round(100 * matched / total)` with halves rounded up, computed in integers.
pub(crate) fn percentage(matched_weight: u32, total_weight: u32) -> u8 {
    if total_weight == 0 {
        return 0;
    }
    let matched = u64::from(matched_weight.min(total_weight));
    let total = u64::from(total_weight);
    ((200 * matched + total) / (2 * total)) as u8
}
