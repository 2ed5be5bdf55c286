use serde::{Deserialize, Serialize};

use super::domain::{Profile, Rule};
use super::evaluation::MatchScorer;
use crate::workflows::error::WorkflowError;
use crate::workflows::schemes::{Scheme, SchemeSummary};

/// One ranked catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeMatch {
    pub scheme: SchemeSummary,
    pub percentage: u8,
    pub matched_rules: Vec<Rule>,
}

/// Ranks a pre-filtered catalog (approved and active schemes) for one profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingService;

impl MatchingService {
    pub fn new() -> Self {
        Self
    }

    /// Score every scheme and sort by percentage, highest first.
    ///
    /// Equal percentages keep their catalog order. Zero-percent matches are included. The
    /// catalog's status is not re-checked here.
    pub fn find_matches(
        &self,
        profile: &Profile,
        catalog: &[Scheme],
    ) -> Result<Vec<SchemeMatch>, WorkflowError> {
        let mut matches = catalog
            .iter()
            .map(|scheme| {
                let outcome = MatchScorer::score(profile, &scheme.rules).map_err(|source| {
                    tracing::warn!(scheme_id = %scheme.id, error = %source, "scheme rule set cannot be evaluated");
                    WorkflowError::RuleConfiguration {
                        scheme_id: scheme.id.0.clone(),
                        source,
                    }
                })?;
                Ok(SchemeMatch {
                    scheme: scheme.summary(),
                    percentage: outcome.percentage,
                    matched_rules: outcome.matched_rules,
                })
            })
            .collect::<Result<Vec<_>, WorkflowError>>()?;

        // `sort_by` is stable, which keeps catalog order for ties.
        matches.sort_by(|left, right| right.percentage.cmp(&left.percentage));
        Ok(matches)
    }
}
