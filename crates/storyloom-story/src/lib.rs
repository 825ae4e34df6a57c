//! Storyloom: story turn management.
//!
//! Responsible for prompt construction, the role-tagged turn history, parsing
//! generated segments, and the controller that drives one story turn at a
//! time, including undo and restart.

pub mod application;
pub mod domain;
