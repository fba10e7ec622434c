//! Cognitive Partner Library
//!
//! A coding-partner client: content abstraction, safe git rollbacks,
//! development monitoring and a typed client for the memory backend.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod logging;
pub mod models;
pub mod output;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
