/// HTTP clients for chat-completion backends.
pub mod client;
pub mod providers;
