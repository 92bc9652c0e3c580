//! Retrieval-augmented generation.

pub mod engine;

pub use engine::{relevant_hits, RagEngine, APOLOGY_MESSAGE};
