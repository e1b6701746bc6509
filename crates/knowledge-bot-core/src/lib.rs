pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod session;

// Re-export main types for convenience
pub use client::{QueryClient, QueryResponse};
pub use config::Config;
pub use conversation::{ChatMessage, ChatRole, Conversation, PendingTurn, Source, ERROR_MESSAGE};
pub use error::QueryError;
pub use session::submit_new_message;
