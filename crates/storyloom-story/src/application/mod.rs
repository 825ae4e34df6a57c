//! Application services orchestrating the story domain.

pub mod controller;
