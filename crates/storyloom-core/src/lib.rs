//! Storyloom Core: shared story abstractions.
//!
//! This crate defines the conversation types and the two ports (generation
//! and presentation) that the turn controller and its collaborators depend
//! on. It contains no infrastructure code.

pub mod error;
pub mod gateway;
pub mod presenter;
pub mod turn;
