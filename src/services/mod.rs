//! External services: git, the backend API and host metrics.

pub mod api;
pub mod git;
pub mod metrics;
