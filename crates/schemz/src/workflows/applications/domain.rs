use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::identity::UserId;
use crate::workflows::schemes::SchemeId;

/// Identifier wrapper for scheme applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Applicant particulars captured when the application is submitted.
///
/// Stored as a frozen copy; later profile edits never reach a submitted application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub category: Option<String>,
    pub religion: Option<String>,
    pub marital_status: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub income: Option<f64>,
    pub disability: Option<String>,
}

impl ApplicantDetails {
    /// Labels of the required particulars that are blank or absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn blank(value: &str) -> bool {
            value.trim().is_empty()
        }
        fn absent(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, blank)
        }

        let checks = [
            ("Full Name", blank(&self.name)),
            ("Email Address", blank(&self.email)),
            ("Phone Number", blank(&self.phone)),
            ("Age", self.age.map_or(true, |age| age == 0)),
            ("Gender", absent(&self.gender)),
            ("Category", absent(&self.category)),
            ("State", absent(&self.state)),
            ("Education", absent(&self.education)),
        ];
        checks
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(label, _)| label)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankDetails {
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_name: Option<String>,
    pub branch_name: Option<String>,
}

/// Scheme-specific answers supplied with the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationData {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub aadhaar_number: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Reference to an uploaded document held by the external blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocuments {
    /// Educational certificate; required on every application.
    #[serde(default)]
    pub marksheet: String,
    #[serde(default)]
    pub income_certificate: Option<String>,
    #[serde(default)]
    pub category_certificate: Option<String>,
    #[serde(default)]
    pub other_documents: Vec<DocumentDescriptor>,
}

/// Citizen request to apply to a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub scheme_id: SchemeId,
    #[serde(default)]
    pub applicant_details: ApplicantDetails,
    #[serde(default)]
    pub application_data: ApplicationData,
    #[serde(default)]
    pub documents: ApplicationDocuments,
}

/// A citizen's application to one scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeApplication {
    pub id: ApplicationId,
    pub user: UserId,
    pub scheme: SchemeId,
    pub status: ApplicationStatus,
    pub applicant_details: ApplicantDetails,
    pub application_data: ApplicationData,
    pub documents: ApplicationDocuments,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
