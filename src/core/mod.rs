//! Core logic modules.

pub mod abstraction;
pub mod executor;
pub mod monitor;
pub mod planner;
