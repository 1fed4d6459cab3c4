//! `procdeck` - Offline procedure execution engine for simulated cockpits.
//!
//! This library interprets compact postfix expression programs against a
//! mutable variable store and composes them into steps, phases, and
//! resumable preset runs driven by a polling tick loop.

pub mod catalogue;
pub mod cli;
pub mod error;
pub mod expr;
pub mod observability;
pub mod run;
pub mod vars;
