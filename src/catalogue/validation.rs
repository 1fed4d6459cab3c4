//! Catalogue validation.
//!
//! Walks a raw [`CatalogueFile`], compiles every expression, and collects
//! ALL issues before reporting, so catalogue authors see the full picture
//! in one pass. Validation and compilation are one walk: an expression
//! that fails to compile is a validation error carrying the exact
//! `phases[i].steps[j].field` path.

use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;

use crate::catalogue::schema::{CatalogueFile, StepConfig};
use crate::catalogue::{Phase, PhaseId, ProcedureCatalogue, ProcedureStep};
use crate::error::{Severity, ValidationIssue};
use crate::expr::Program;

/// Result of validating a catalogue file.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Issues that prevent the catalogue from being used.
    pub errors: Vec<ValidationIssue>,
    /// Issues worth surfacing that do not block loading.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether validation passed (no errors; warnings allowed).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether any warnings were raised.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Catalogue validator and compiler.
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    expedite_steps: usize,
}

impl Validator {
    /// Validates a raw catalogue file and compiles it.
    ///
    /// Returns the compiled catalogue only when validation produced no
    /// errors, together with every issue found.
    #[must_use]
    pub fn validate(file: &CatalogueFile) -> (Option<ProcedureCatalogue>, ValidationResult) {
        let mut validator = Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            expedite_steps: 0,
        };
        let catalogue = validator.walk(file);
        let result = ValidationResult {
            errors: validator.errors,
            warnings: validator.warnings,
        };
        let catalogue = if result.is_valid() { Some(catalogue) } else { None };
        (catalogue, result)
    }

    fn walk(&mut self, file: &CatalogueFile) -> ProcedureCatalogue {
        if file.aircraft.name.trim().is_empty() {
            self.warning("aircraft.name", "aircraft name is empty");
        }
        if file.phases.is_empty() {
            self.error("phases", "catalogue defines no phases");
        }

        let mut phases: IndexMap<PhaseId, Phase> = IndexMap::new();
        let mut seen: HashSet<PhaseId> = HashSet::new();

        for (pi, phase_config) in file.phases.iter().enumerate() {
            let base = format!("phases[{pi}]");
            let id = PhaseId::parse(&phase_config.name);
            if id.is_none() {
                self.error(
                    &format!("{base}.name"),
                    &format!(
                        "unknown phase name '{}' (not one of the eight canonical phases)",
                        phase_config.name
                    ),
                );
            }
            if let Some(id) = id {
                if !seen.insert(id) {
                    self.error(
                        &format!("{base}.name"),
                        &format!("duplicate phase name '{}'", phase_config.name),
                    );
                }
            }
            if phase_config.steps.is_empty() {
                self.error(&format!("{base}.steps"), "phase has no steps");
            }

            let steps: Vec<ProcedureStep> = phase_config
                .steps
                .iter()
                .enumerate()
                .map(|(si, step)| self.compile_step(&format!("{base}.steps[{si}]"), step))
                .collect();

            if let Some(id) = id {
                phases.entry(id).or_insert(Phase { id, steps });
            }
        }

        if self.expedite_steps > 0 {
            self.warning(
                "phases",
                &format!(
                    "{} step(s) set 'expedite'; the flag is recognized but has no effect",
                    self.expedite_steps
                ),
            );
        }
        if !phases.is_empty() && phases.len() < PhaseId::ALL.len() {
            self.warning(
                "phases",
                &format!(
                    "catalogue defines {} of the {} standard phases",
                    phases.len(),
                    PhaseId::ALL.len()
                ),
            );
        }

        ProcedureCatalogue::new(file.aircraft.clone(), phases)
    }

    fn compile_step(&mut self, base: &str, step: &StepConfig) -> ProcedureStep {
        if step.name.trim().is_empty() {
            self.warning(&format!("{base}.name"), "step name is empty");
        }
        if step.timeout_ms.is_none() {
            self.error(
                &format!("{base}.timeout_ms"),
                "missing required field 'timeout_ms'",
            );
        }

        let check = self.compile_field(&format!("{base}.check"), &step.check);
        if check.mutates() {
            self.error(
                &format!("{base}.check"),
                "check predicate mutates state (writes and triggers are not allowed here)",
            );
        }
        let program = self.compile_field(&format!("{base}.program"), &step.program);

        if step.pure_wait {
            if program.is_empty() {
                self.error(
                    &format!("{base}.program"),
                    "pure wait requires a wait predicate in 'program'",
                );
            } else if program.mutates() {
                self.error(
                    &format!("{base}.program"),
                    "wait predicate mutates state (writes and triggers are not allowed here)",
                );
            }
            if !step.check.trim().is_empty() {
                self.warning(
                    &format!("{base}.check"),
                    "check is ignored for pure waits (the wait predicate lives in 'program')",
                );
            }
        } else if check.is_empty() && program.is_empty() {
            self.warning(base, "step has neither 'check' nor 'program'");
        }

        if step.expedite {
            self.expedite_steps += 1;
        }

        ProcedureStep {
            name: step.name.clone(),
            display_id: step.display_id,
            pure_wait: step.pure_wait,
            timeout: Duration::from_millis(step.timeout_ms.unwrap_or(0)),
            check,
            program,
            expedite: step.expedite,
        }
    }

    /// Compiles one expression field; a compile failure becomes an error
    /// issue and yields the empty program so the walk can continue.
    fn compile_field(&mut self, path: &str, source: &str) -> Program {
        match Program::compile(source) {
            Ok(program) => program,
            Err(err) => {
                self.error(path, &err.to_string());
                Program::empty()
            }
        }
    }

    fn error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}
