//! HTTP handlers grouped by resource.

pub mod agents;
pub mod assessments;
pub mod health;
pub mod master_data;
pub mod messages;
pub mod onboarding;
pub mod security;
pub mod tenants;
pub mod vendors;
