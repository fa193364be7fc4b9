/// Llmload library - exposes modules for testing and external use.
pub mod config;
pub mod error;
pub mod http;
pub mod loadgen;
