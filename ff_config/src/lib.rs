//! Configuration access for formation-flying instruments.
//!
//! Instrument files are sectioned key/value documents. Fields fall into two
//! tiers: policy fields that always resolve (possibly to a default, possibly
//! with a [`ConfigDiagnostic`]), and structural fields whose absence is a
//! fatal [`ConfigErrors`].

pub mod diagnostic;
pub mod field;
pub mod reader;
pub mod source;

use std::path::PathBuf;
use thiserror::Error;

pub use diagnostic::{ConfigDiagnostic, Severity};
pub use field::{Field, Selection, resolve_prescaler, resolve_reference_sat_id, resolve_selection};
pub use reader::{Loaded, SectionReader};
pub use source::{ConfigFile, ConfigurationSource};

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("key '{key}' not found in section '{section}'")]
    KeyNotFound { section: String, key: String },
    #[error("key '{key}' in section '{section}' has {found} values, expected {expected}")]
    LengthMismatch {
        section: String,
        key: String,
        expected: usize,
        found: usize,
    },
    #[error("section '{0}' not found")]
    SectionNotFound(String),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("key '{key}' in section '{section}' is not {expected}")]
    TypeMismatch {
        section: String,
        key: String,
        expected: &'static str,
    },
}
