//! Domain model for a single story session.

pub mod history;
pub mod parameters;
pub mod prompts;
pub mod segment;
