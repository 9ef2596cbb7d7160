//! Subcommand implementations

pub mod catalog;
pub mod inspect;
pub mod predict;
