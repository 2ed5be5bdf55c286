//! Scheme review state machine.
//!
//! ```text
//! draft ──submit──▶ pending ──approve──▶ approved (active ⇄ inactive)
//!   ▲                  │
//!   │               reject
//!   │                  ▼
//!   └── (edit) ── rejected ──submit──▶ pending
//! ```
//!
//! Only drafts can be deleted. Every illegal call fails with `InvalidTransition`.

use chrono::Utc;

use super::domain::{Scheme, SchemeDetails, SchemeId, SchemeStatus};
use crate::workflows::eligibility::Rule;
use crate::workflows::error::{require_text, EntityKind, WorkflowError};
use crate::workflows::identity::UserId;

impl Scheme {
    /// New draft owned by `owner`. Rules may still be empty.
    pub fn draft(id: SchemeId, owner: UserId, details: SchemeDetails) -> Result<Self, WorkflowError> {
        let details = validate_details(details)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: details.name,
            description: details.description,
            benefits: details.benefits,
            ministry: details.ministry,
            status: SchemeStatus::Draft,
            active: false,
            rules: details.rules,
            created_by: owner,
            approved_by: None,
            remarks: String::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    pub fn ensure_owner(&self, actor: &UserId, action: &str) -> Result<(), WorkflowError> {
        if &self.created_by == actor {
            Ok(())
        } else {
            Err(WorkflowError::Unauthorized(format!(
                "only the owning organizer may {action} scheme '{}'",
                self.id
            )))
        }
    }

    /// Replace the editable fields. Owner only, and only while draft or rejected.
    pub fn revise(&mut self, actor: &UserId, details: SchemeDetails) -> Result<(), WorkflowError> {
        self.ensure_owner(actor, "update")?;
        self.require_status(&[SchemeStatus::Draft, SchemeStatus::Rejected], "update")?;
        let details = validate_details(details)?;

        self.name = details.name;
        self.description = details.description;
        self.benefits = details.benefits;
        self.ministry = details.ministry;
        self.rules = details.rules;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Send for admin review. Clears remarks left by a previous rejection.
    pub fn submit(&mut self) -> Result<(), WorkflowError> {
        self.require_status(&[SchemeStatus::Draft, SchemeStatus::Rejected], "submit")?;
        if self.rules.is_empty() {
            return Err(WorkflowError::Validation(
                "a scheme needs at least one eligibility rule before submission".to_string(),
            ));
        }
        validate_rules(&self.rules)?;

        self.transition(SchemeStatus::Pending);
        self.remarks.clear();
        Ok(())
    }

    pub fn approve(&mut self, admin: &UserId, remarks: Option<&str>) -> Result<(), WorkflowError> {
        self.require_status(&[SchemeStatus::Pending], "approve")?;

        self.transition(SchemeStatus::Approved);
        self.active = true;
        self.approved_by = Some(admin.clone());
        self.remarks = remarks.map(str::trim).unwrap_or_default().to_string();
        Ok(())
    }

    pub fn reject(&mut self, remarks: &str) -> Result<(), WorkflowError> {
        self.require_status(&[SchemeStatus::Pending], "reject")?;
        let remarks = require_text(remarks, "rejection remarks")?;

        self.transition(SchemeStatus::Rejected);
        self.active = false;
        self.remarks = remarks;
        Ok(())
    }

    /// Flip `active` on an approved scheme, returning the new value.
    pub fn toggle_active(&mut self) -> Result<bool, WorkflowError> {
        self.require_status(&[SchemeStatus::Approved], "toggle")?;
        self.active = !self.active;
        self.updated_at = Utc::now();
        Ok(self.active)
    }

    pub fn ensure_deletable(&self) -> Result<(), WorkflowError> {
        self.require_status(&[SchemeStatus::Draft], "delete")
    }

    fn require_status(
        &self,
        allowed: &[SchemeStatus],
        attempted: &'static str,
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        tracing::debug!(
            scheme_id = %self.id,
            from = self.status.label(),
            attempted,
            "rejected scheme transition"
        );
        Err(WorkflowError::InvalidTransition {
            entity: EntityKind::Scheme,
            from: self.status.label().to_string(),
            attempted,
        })
    }

    fn transition(&mut self, to: SchemeStatus) {
        tracing::info!(
            scheme_id = %self.id,
            from = self.status.label(),
            to = to.label(),
            "scheme transition"
        );
        self.status = to;
        self.updated_at = Utc::now();
    }
}

fn validate_details(details: SchemeDetails) -> Result<SchemeDetails, WorkflowError> {
    let rules = details
        .rules
        .into_iter()
        .map(|rule| {
            rule.validated()
                .map_err(|err| WorkflowError::Validation(err.to_string()))
        })
        .collect::<Result<Vec<Rule>, WorkflowError>>()?;

    Ok(SchemeDetails {
        name: require_text(&details.name, "scheme name")?,
        description: require_text(&details.description, "description")?,
        benefits: require_text(&details.benefits, "benefits")?,
        ministry: require_text(&details.ministry, "ministry/department")?,
        rules,
    })
}

fn validate_rules(rules: &[Rule]) -> Result<(), WorkflowError> {
    rules
        .iter()
        .try_for_each(|rule| rule.validate())
        .map_err(|err| WorkflowError::Validation(err.to_string()))
}
