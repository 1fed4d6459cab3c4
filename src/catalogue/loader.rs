//! Catalogue loading pipeline.
//!
//! Stages: read file, YAML parse, expression compilation + validation,
//! freeze into `Arc`. Every stage failure is fatal; a catalogue that loads
//! is fully compiled and structurally sound.

use std::path::Path;
use std::sync::Arc;

use crate::catalogue::ProcedureCatalogue;
use crate::catalogue::schema::CatalogueFile;
use crate::catalogue::validation::Validator;
use crate::error::{CatalogueError, ValidationIssue};

/// Options controlling catalogue loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    /// Treat validation warnings as load failures.
    pub strict: bool,
}

/// A successfully loaded catalogue plus non-fatal findings.
#[derive(Debug)]
pub struct LoadedCatalogue {
    /// The compiled catalogue, frozen for sharing across runs.
    pub catalogue: Arc<ProcedureCatalogue>,
    /// Warnings raised during validation.
    pub warnings: Vec<ValidationIssue>,
}

/// Staged catalogue loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogueLoader {
    options: LoaderOptions,
}

impl CatalogueLoader {
    /// Loader with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with explicit options.
    #[must_use]
    pub const fn with_options(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Loads and validates a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::MissingFile`] when the path does not
    /// exist, [`CatalogueError::Io`] when it cannot be read, and the parse
    /// or validation variants for malformed content.
    pub fn load(&self, path: &Path) -> Result<LoadedCatalogue, CatalogueError> {
        if !path.exists() {
            return Err(CatalogueError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        self.load_str(&text, &path.display().to_string())
    }

    /// Loads a catalogue from already-read text. `origin` labels errors
    /// and log lines, usually the file path.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::ParseError`] for malformed YAML and
    /// [`CatalogueError::ValidationError`] when validation finds errors
    /// (or, in strict mode, warnings).
    pub fn load_str(&self, text: &str, origin: &str) -> Result<LoadedCatalogue, CatalogueError> {
        let file: CatalogueFile =
            serde_yaml::from_str(text).map_err(|err| CatalogueError::ParseError {
                path: origin.into(),
                line: err.location().map(|loc| loc.line()),
                message: err.to_string(),
            })?;

        let (catalogue, mut result) = Validator::validate(&file);
        if self.options.strict && result.has_warnings() {
            result.errors.append(&mut result.warnings);
        }

        match catalogue {
            Some(catalogue) if result.errors.is_empty() => {
                tracing::debug!(
                    origin,
                    aircraft = %catalogue.aircraft().name,
                    phases = catalogue.len(),
                    "catalogue loaded"
                );
                Ok(LoadedCatalogue {
                    catalogue: Arc::new(catalogue),
                    warnings: result.warnings,
                })
            }
            _ => Err(CatalogueError::ValidationError {
                path: origin.to_string(),
                errors: result.errors,
            }),
        }
    }
}
