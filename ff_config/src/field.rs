use std::fmt;

use crate::ConfigDiagnostic;

/// The outcome of resolving a policy field.
#[derive(Clone, Debug, PartialEq)]
pub enum Field<T> {
    /// The configured value was used as given.
    Resolved(T),
    /// The configured value was replaced. Silent replacements carry no diagnostic.
    Defaulted {
        value: T,
        diagnostic: Option<ConfigDiagnostic>,
    },
}

impl<T> Field<T> {
    pub fn value(&self) -> &T {
        match self {
            Field::Resolved(value) => value,
            Field::Defaulted { value, .. } => value,
        }
    }

    pub fn diagnostic(&self) -> Option<&ConfigDiagnostic> {
        match self {
            Field::Resolved(_) => None,
            Field::Defaulted { diagnostic, .. } => diagnostic.as_ref(),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Field::Defaulted { .. })
    }

    pub fn into_parts(self) -> (T, Option<ConfigDiagnostic>) {
        match self {
            Field::Resolved(value) => (value, None),
            Field::Defaulted { value, diagnostic } => (value, diagnostic),
        }
    }
}

/// A closed set of named options read from a string key.
pub trait Selection: Copy + fmt::Display + Sized {
    /// Used when the configured name is not recognized.
    const DEFAULT: Self;

    /// Exact, case-sensitive lookup.
    fn from_name(name: &str) -> Option<Self>;
}

/// Values of one or less run the component every step. Never warns.
pub fn resolve_prescaler(raw: i64) -> Field<u64> {
    if raw < 1 {
        Field::Defaulted {
            value: 1,
            diagnostic: None,
        }
    } else {
        Field::Resolved(raw as u64)
    }
}

/// Negative ids select the caller's fallback spacecraft.
pub fn resolve_reference_sat_id(raw: i64, fallback: i64) -> Field<i64> {
    if raw < 0 {
        Field::Defaulted {
            value: fallback,
            diagnostic: None,
        }
    } else {
        Field::Resolved(raw)
    }
}

pub fn resolve_selection<S: Selection>(section: &str, key: &str, raw: &str) -> Field<S> {
    match S::from_name(raw) {
        Some(selection) => Field::Resolved(selection),
        None => Field::Defaulted {
            value: S::DEFAULT,
            diagnostic: Some(ConfigDiagnostic::warning(section, key, raw, S::DEFAULT)),
        },
    }
}
