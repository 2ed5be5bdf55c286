//! Citizen applications to approved schemes.

pub mod domain;
mod lifecycle;
pub mod service;

pub use domain::{
    ApplicantDetails, ApplicationData, ApplicationDocuments, ApplicationId, ApplicationStatus,
    ApplicationSubmission, BankDetails, DocumentDescriptor, SchemeApplication,
};
pub use service::ApplicationService;
