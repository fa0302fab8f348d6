//! Reporters: everything the user sees about a run goes through one of these.

pub mod jsonl;
pub mod text;

pub use jsonl::JsonlReporter;
pub use text::TextReporter;
