//! Scheme authoring and review.

pub mod domain;
mod lifecycle;
pub mod service;

pub use domain::{Scheme, SchemeDetails, SchemeId, SchemeStatus, SchemeSummary};
pub use service::SchemeService;
