//! Command-line interface.
//!
//! Argument definitions live in [`args`]; command handlers and the
//! dispatcher live in [`commands`].

pub mod args;
pub mod commands;
