//! Compiled expression programs.

use crate::error::ExprError;
use crate::expr::{eval, parse};
use crate::vars::VariableStore;

/// One instruction of the closed postfix instruction set.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Push a numeric literal.
    Push(f64),
    /// Push the value of a named flag variable.
    ReadFlag(String),
    /// Push the value of an indexed, unit-tagged simulator variable.
    ReadSim {
        /// Variable name (may contain spaces).
        name: String,
        /// Optional index (`(A:NAME:2, ...)`).
        index: Option<u32>,
        /// Optional unit tag (`(A:NAME, Bool)`).
        unit: Option<String>,
    },
    /// Pop a value and write it to a named flag variable.
    WriteFlag(String),
    /// Pop a value and fire a named one-shot event with it as parameter.
    TriggerEvent {
        /// Event name.
        name: String,
        /// Optional event index (`(>K:2:NAME)`).
        index: Option<u32>,
    },
    /// Pop two values, push 1 when they are equal.
    Eq,
    /// Pop two values, push 1 when the earlier-pushed is less than the later.
    Lt,
    /// Pop one value, push its logical negation.
    Not,
    /// Pop two values, push their logical AND.
    And,
    /// Pop two values, push their logical OR.
    Or,
    /// Pop one value, run the sub-program when it is non-zero.
    If(Vec<Instr>),
}

/// A compiled postfix expression.
///
/// Compilation performs static stack-depth analysis, so evaluation cannot
/// underflow and never panics on a program the compiler accepted. The
/// original source text is retained for listings and diagnostics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    source: String,
    instrs: Vec<Instr>,
}

impl Program {
    /// Compiles source text into a program.
    ///
    /// The empty string compiles to the empty program, which evaluates
    /// to `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] for unknown tokens, static stack underflow,
    /// a stray `}`, or a conditional block with nonzero net stack effect.
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let instrs = parse::compile(source)?;
        Ok(Self {
            source: source.to_string(),
            instrs,
        })
    }

    /// The empty program.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// The source text this program was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled instructions.
    #[must_use]
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Whether the program contains any flag write or event trigger,
    /// including inside conditional blocks.
    ///
    /// Used at catalogue load to reject predicates that would mutate
    /// state while being polled.
    #[must_use]
    pub fn mutates(&self) -> bool {
        instrs_mutate(&self.instrs)
    }

    /// Runs the program against a store and returns the top of stack
    /// (`0.0` when the stack ends empty).
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::Variable`] when the store fails to resolve a
    /// name the program touches.
    pub fn evaluate(&self, vars: &dyn VariableStore) -> Result<f64, ExprError> {
        eval::evaluate(&self.instrs, vars)
    }

    /// Runs the program and maps the result to its truthiness
    /// (non-zero is true).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Program::evaluate`].
    pub fn evaluate_bool(&self, vars: &dyn VariableStore) -> Result<bool, ExprError> {
        Ok(eval::truthy(self.evaluate(vars)?))
    }
}

fn instrs_mutate(instrs: &[Instr]) -> bool {
    instrs.iter().any(|instr| match instr {
        Instr::WriteFlag(_) | Instr::TriggerEvent { .. } => true,
        Instr::If(block) => instrs_mutate(block),
        _ => false,
    })
}
