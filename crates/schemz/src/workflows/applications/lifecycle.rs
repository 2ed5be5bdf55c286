//! Application review state machine: `pending → approved | rejected`, both terminal.

use chrono::Utc;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission, SchemeApplication};
use crate::workflows::error::{require_text, EntityKind, WorkflowError};
use crate::workflows::identity::{Actor, Role, UserId};
use crate::workflows::schemes::{Scheme, SchemeStatus};

impl SchemeApplication {
    /// Open a pending application against an approved scheme.
    ///
    /// Uniqueness per (user, scheme) is the store's job; this only checks the scheme's state
    /// and the submission's completeness.
    pub fn open(
        id: ApplicationId,
        user: UserId,
        scheme: &Scheme,
        submission: ApplicationSubmission,
    ) -> Result<Self, WorkflowError> {
        if scheme.status != SchemeStatus::Approved {
            return Err(WorkflowError::InvalidTransition {
                entity: EntityKind::Scheme,
                from: scheme.status.label().to_string(),
                attempted: "apply to",
            });
        }

        let missing = submission.applicant_details.missing_fields();
        if !missing.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "please complete your profile before applying; missing fields: {}",
                missing.join(", ")
            )));
        }

        let mut application_data = submission.application_data;
        application_data.purpose =
            require_text(&application_data.purpose, "purpose of application")?;
        let mut documents = submission.documents;
        documents.marksheet = require_text(&documents.marksheet, "marksheet/educational certificate")?;

        Ok(Self {
            id,
            user,
            scheme: scheme.id.clone(),
            status: ApplicationStatus::Pending,
            applicant_details: submission.applicant_details,
            application_data,
            documents,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            submitted_at: Utc::now(),
        })
    }

    pub fn approve(&mut self, reviewer: &UserId) -> Result<(), WorkflowError> {
        self.require_pending("approve")?;
        self.record_review(reviewer, ApplicationStatus::Approved);
        Ok(())
    }

    pub fn reject(&mut self, reviewer: &UserId, reason: &str) -> Result<(), WorkflowError> {
        self.require_pending("reject")?;
        let reason = require_text(reason, "rejection reason")?;
        self.record_review(reviewer, ApplicationStatus::Rejected);
        self.rejection_reason = Some(reason);
        Ok(())
    }

    fn require_pending(&self, attempted: &'static str) -> Result<(), WorkflowError> {
        if self.status == ApplicationStatus::Pending {
            return Ok(());
        }
        tracing::debug!(
            application_id = %self.id,
            from = self.status.label(),
            attempted,
            "rejected application transition"
        );
        Err(WorkflowError::InvalidTransition {
            entity: EntityKind::Application,
            from: self.status.label().to_string(),
            attempted,
        })
    }

    fn record_review(&mut self, reviewer: &UserId, to: ApplicationStatus) {
        tracing::info!(
            application_id = %self.id,
            scheme_id = %self.scheme,
            reviewer = %reviewer,
            to = to.label(),
            "application reviewed"
        );
        self.status = to;
        self.reviewed_by = Some(reviewer.clone());
        self.reviewed_at = Some(Utc::now());
    }
}

/// Reviewers are admins or the organizer who owns the scheme.
pub(crate) fn ensure_reviewer(actor: &Actor, scheme: &Scheme) -> Result<(), WorkflowError> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Organizer if scheme.created_by == actor.id => Ok(()),
        _ => Err(WorkflowError::Unauthorized(format!(
            "only an admin or the organizer of scheme '{}' may review its applications",
            scheme.id
        ))),
    }
}
