/// Provider-specific chat-completion client implementations.
pub mod anthropic;
pub mod generic;
pub mod openai;
