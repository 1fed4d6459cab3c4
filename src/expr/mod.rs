//! Postfix expression language for procedure steps.
//!
//! Procedures act on the simulated cockpit through a compact stack
//! language: numeric literals, flag and simulator-state reads, flag writes,
//! one-shot event triggers, comparison and logical operators, and `if{ }`
//! conditional blocks. Sources are compiled once at catalogue load into a
//! closed instruction set ([`Instr`]); compile errors (unknown token, stack
//! underflow, unbalanced block) are fatal there, so evaluation against a
//! [`crate::vars::VariableStore`] can only fail on name resolution.

mod eval;
mod parse;
mod program;

pub use program::{Instr, Program};
