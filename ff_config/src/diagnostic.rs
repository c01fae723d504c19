use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
}

/// A recoverable configuration problem and the value chosen in its place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    pub section: String,
    pub key: String,
    /// The offending configured value, verbatim.
    pub value: String,
    /// The value used instead.
    pub default: String,
}

impl ConfigDiagnostic {
    pub fn warning(
        section: &str,
        key: &str,
        value: impl fmt::Display,
        default: impl fmt::Display,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            default: default.to_string(),
        }
    }

    /// Routes the diagnostic to the `log` facade.
    pub fn emit(&self) {
        match self.severity {
            Severity::Warning => log::warn!(target: "ff_config", "{self}"),
        }
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: unrecognized value '{}', using {}",
            self.section, self.key, self.value, self.default
        )
    }
}
