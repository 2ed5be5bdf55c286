use chrono::Utc;

use super::domain::{
    PromotionForm, PromotionRequest, PromotionRequestId, PromotionStatus,
    DEFAULT_APPROVAL_REMARKS, MIN_REASON_CHARS,
};
use crate::workflows::error::{require_text, EntityKind, WorkflowError};
use crate::workflows::identity::UserId;

impl PromotionRequest {
    pub fn open(
        id: PromotionRequestId,
        user: UserId,
        form: PromotionForm,
    ) -> Result<Self, WorkflowError> {
        let organization = require_text(&form.organization, "organization/department name")?;
        let designation = require_text(&form.designation, "designation")?;
        let contact_number = require_text(&form.contact_number, "contact number")?;
        let reason = require_text(&form.reason, "reason for application")?;
        if reason.chars().count() < MIN_REASON_CHARS {
            return Err(WorkflowError::Validation(format!(
                "reason for application must be at least {MIN_REASON_CHARS} characters"
            )));
        }

        Ok(Self {
            id,
            user,
            organization,
            designation,
            reason,
            contact_number,
            status: PromotionStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            remarks: None,
            submitted_at: Utc::now(),
        })
    }

    pub fn approve(&mut self, admin: &UserId, remarks: Option<&str>) -> Result<(), WorkflowError> {
        self.require_pending("approve")?;
        let remarks = remarks
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_APPROVAL_REMARKS);
        self.record_review(admin, PromotionStatus::Approved, remarks.to_string());
        Ok(())
    }

    pub fn reject(&mut self, admin: &UserId, remarks: &str) -> Result<(), WorkflowError> {
        self.require_pending("reject")?;
        let remarks = require_text(remarks, "rejection remarks")?;
        self.record_review(admin, PromotionStatus::Rejected, remarks);
        Ok(())
    }

    pub(crate) fn require_pending(&self, attempted: &'static str) -> Result<(), WorkflowError> {
        if self.status == PromotionStatus::Pending {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: EntityKind::PromotionRequest,
                from: self.status.label().to_string(),
                attempted,
            })
        }
    }

    fn record_review(&mut self, admin: &UserId, to: PromotionStatus, remarks: String) {
        self.status = to;
        self.reviewed_by = Some(admin.clone());
        self.reviewed_at = Some(Utc::now());
        self.remarks = Some(remarks);
    }
}
