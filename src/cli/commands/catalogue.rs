//! Catalogue command handlers.
//!
//! Implements `catalogue validate` and `catalogue list`.

use serde_json::json;

use crate::catalogue::{CatalogueLoader, LoaderOptions, ProcedureCatalogue};
use crate::cli::args::{CatalogueListArgs, CatalogueValidateArgs, OutputFormat};
use crate::error::{CatalogueError, ProcdeckError, Severity, ValidationIssue};
use crate::run::millis;

/// Validate catalogue files without running anything.
///
/// All files are processed even when an early one fails, so a batch
/// invocation reports every broken catalogue at once. The first failure
/// is returned at the end and drives the exit code.
///
/// # Errors
///
/// Returns a catalogue error when any file fails to parse or validate,
/// or an I/O error when a file cannot be read.
pub fn validate(args: &CatalogueValidateArgs) -> Result<(), ProcdeckError> {
    let loader = CatalogueLoader::with_options(LoaderOptions {
        strict: args.strict,
    });
    let mut reports = Vec::new();
    let mut first_error: Option<CatalogueError> = None;

    for path in &args.files {
        match loader.load(path) {
            Ok(loaded) => {
                for warning in &loaded.warnings {
                    tracing::warn!(file = %path.display(), "{warning}");
                }
                let steps: usize = loaded.catalogue.phases().map(|p| p.steps.len()).sum();
                match args.format {
                    OutputFormat::Human => {
                        println!(
                            "{}: ok ({} phases, {} steps)",
                            path.display(),
                            loaded.catalogue.len(),
                            steps
                        );
                    }
                    OutputFormat::Json => {
                        reports.push(json!({
                            "file": path.display().to_string(),
                            "valid": true,
                            "phases": loaded.catalogue.len(),
                            "steps": steps,
                            "issues": issues_json(&loaded.warnings),
                        }));
                    }
                }
            }
            Err(CatalogueError::ValidationError { path: origin, errors }) => {
                match args.format {
                    OutputFormat::Human => {
                        println!("{}: {} issue(s)", path.display(), errors.len());
                        for issue in &errors {
                            println!("  {issue}");
                        }
                    }
                    OutputFormat::Json => {
                        reports.push(json!({
                            "file": path.display().to_string(),
                            "valid": false,
                            "issues": issues_json(&errors),
                        }));
                    }
                }
                if first_error.is_none() {
                    first_error = Some(CatalogueError::ValidationError {
                        path: origin,
                        errors,
                    });
                }
            }
            Err(other) => return Err(other.into()),
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    match first_error {
        None => Ok(()),
        Some(err) => Err(err.into()),
    }
}

/// List the phases and steps of a catalogue.
///
/// # Errors
///
/// Returns a catalogue error when the file fails to load.
pub fn list(args: &CatalogueListArgs) -> Result<(), ProcdeckError> {
    let loader = CatalogueLoader::new();
    let loaded = loader.load(&args.file)?;
    for warning in &loaded.warnings {
        tracing::warn!(file = %args.file.display(), "{warning}");
    }

    match args.format {
        OutputFormat::Human => print_human(&loaded.catalogue),
        OutputFormat::Json => {
            let phases: Vec<_> = loaded
                .catalogue
                .phases()
                .map(|phase| {
                    json!({
                        "id": phase.id.as_str(),
                        "steps": phase.steps.iter().map(|step| json!({
                            "display_id": step.display_id,
                            "name": step.name,
                            "kind": step_kind(step.pure_wait),
                            "timeout_ms": millis(step.timeout),
                            "expedite": step.expedite,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let doc = json!({
                "aircraft": loaded.catalogue.aircraft(),
                "phases": phases,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn print_human(catalogue: &ProcedureCatalogue) {
    let aircraft = catalogue.aircraft();
    match &aircraft.variant {
        Some(variant) => println!("{} ({variant})", aircraft.name),
        None => println!("{}", aircraft.name),
    }

    for phase in catalogue.phases() {
        println!("\n{} ({} steps)", phase.id, phase.steps.len());
        for step in &phase.steps {
            let marker = if step.expedite { " [expedite]" } else { "" };
            println!(
                "  [{:>4}] {:<44} {:<7} timeout {}ms{marker}",
                step.display_id,
                step.name,
                step_kind(step.pure_wait),
                millis(step.timeout)
            );
        }
    }
}

const fn step_kind(pure_wait: bool) -> &'static str {
    if pure_wait { "await" } else { "command" }
}

fn issues_json(issues: &[ValidationIssue]) -> Vec<serde_json::Value> {
    issues
        .iter()
        .map(|issue| {
            json!({
                "severity": match issue.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                },
                "path": issue.path,
                "message": issue.message,
            })
        })
        .collect()
}
