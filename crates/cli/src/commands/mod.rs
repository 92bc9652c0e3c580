//! Command handlers for the Textbook Tutor CLI.

pub mod chat;
pub mod health;
pub mod ingest;

pub use chat::ChatCommand;
pub use health::HealthCommand;
pub use ingest::IngestCommand;
