use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identity::UserId;

/// Minimum length of the free-text motivation on a promotion request.
pub const MIN_REASON_CHARS: usize = 50;

/// Remarks recorded when an admin approves without writing any.
pub const DEFAULT_APPROVAL_REMARKS: &str = "Application approved";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromotionRequestId(pub String);

impl fmt::Display for PromotionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PromotionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Approved => "approved",
            PromotionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Details a citizen supplies when asking to become an organizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionForm {
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub contact_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRequest {
    pub id: PromotionRequestId,
    pub user: UserId,
    pub organization: String,
    pub designation: String,
    pub reason: String,
    pub contact_number: String,
    pub status: PromotionStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
