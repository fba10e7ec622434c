//! Document generators: rollback reports and graph diagrams.

pub mod diagram;
pub mod report;
