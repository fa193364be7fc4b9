/// Load generation and result aggregation.
pub mod generator;
pub mod persist;
pub mod prompts;
pub mod report;
