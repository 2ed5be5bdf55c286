use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::eligibility::Rule;
use crate::workflows::identity::UserId;

/// Identifier wrapper for schemes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemeId(pub String);

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status of a scheme. `active` is tracked separately and only meaningful once approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl SchemeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SchemeStatus::Draft => "draft",
            SchemeStatus::Pending => "pending",
            SchemeStatus::Approved => "approved",
            SchemeStatus::Rejected => "rejected",
        }
    }

    /// Statuses in which the owning organizer may still edit the scheme.
    pub const fn is_editable(self) -> bool {
        matches!(self, SchemeStatus::Draft | SchemeStatus::Rejected)
    }
}

impl fmt::Display for SchemeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Organizer-editable portion of a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: String,
    #[serde(default)]
    pub ministry: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Government scheme with its eligibility rule set and review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: SchemeId,
    pub name: String,
    pub description: String,
    pub benefits: String,
    pub ministry: String,
    pub status: SchemeStatus,
    pub active: bool,
    pub rules: Vec<Rule>,
    pub created_by: UserId,
    pub approved_by: Option<UserId>,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented by the store on every write; used for optimistic concurrency.
    pub revision: u64,
}

impl Scheme {
    pub fn summary(&self) -> SchemeSummary {
        SchemeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            benefits: self.benefits.clone(),
            ministry: self.ministry.clone(),
        }
    }
}

/// Public description of a scheme without its rules or review metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub id: SchemeId,
    pub name: String,
    pub description: String,
    pub benefits: String,
    pub ministry: String,
}
