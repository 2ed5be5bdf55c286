//! Citizen requests to become scheme organizers.

pub mod domain;
mod lifecycle;
pub mod service;

pub use domain::{
    PromotionForm, PromotionRequest, PromotionRequestId, PromotionStatus,
    DEFAULT_APPROVAL_REMARKS, MIN_REASON_CHARS,
};
pub use service::PromotionService;
