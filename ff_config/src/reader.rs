use nalgebra::{SMatrix, SVector};

use crate::{
    ConfigDiagnostic, ConfigErrors, ConfigurationSource, Field, Selection, resolve_prescaler,
    resolve_reference_sat_id, resolve_selection,
};

/// A value loaded from configuration together with the diagnostics raised
/// while resolving it.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

impl<T> Loaded<T> {
    /// Emits every diagnostic to the log and returns the value.
    pub fn emit(self) -> T {
        for diagnostic in &self.diagnostics {
            diagnostic.emit();
        }
        self.value
    }
}

/// Reads keys from a single section, collecting diagnostics for policy fields.
pub struct SectionReader<'c> {
    source: &'c dyn ConfigurationSource,
    section: &'c str,
    diagnostics: Vec<ConfigDiagnostic>,
}

impl<'c> SectionReader<'c> {
    pub fn new(source: &'c dyn ConfigurationSource, section: &'c str) -> Self {
        Self {
            source,
            section,
            diagnostics: Vec::new(),
        }
    }

    pub fn section(&self) -> &str {
        self.section
    }

    pub fn contains(&self, key: &str) -> bool {
        self.source.contains(self.section, key)
    }

    pub fn read_int(&self, key: &str) -> Result<i64, ConfigErrors> {
        self.source.read_int(self.section, key)
    }

    pub fn read_double(&self, key: &str) -> Result<f64, ConfigErrors> {
        self.source.read_double(self.section, key)
    }

    pub fn read_double_or(&self, key: &str, default: f64) -> Result<f64, ConfigErrors> {
        if self.contains(key) {
            self.read_double(key)
        } else {
            Ok(default)
        }
    }

    pub fn read_string(&self, key: &str) -> Result<String, ConfigErrors> {
        self.source.read_string(self.section, key)
    }

    pub fn read_vector<const N: usize>(&self, key: &str) -> Result<SVector<f64, N>, ConfigErrors> {
        let values = self.read_exact(key, N)?;
        Ok(SVector::from_column_slice(&values))
    }

    pub fn read_vector_or<const N: usize>(
        &self,
        key: &str,
        default: SVector<f64, N>,
    ) -> Result<SVector<f64, N>, ConfigErrors> {
        if self.contains(key) {
            self.read_vector(key)
        } else {
            Ok(default)
        }
    }

    /// Reads an N×N matrix stored row-major.
    pub fn read_matrix_or<const N: usize>(
        &self,
        key: &str,
        default: SMatrix<f64, N, N>,
    ) -> Result<SMatrix<f64, N, N>, ConfigErrors> {
        if !self.contains(key) {
            return Ok(default);
        }
        let values = self.read_exact(key, N * N)?;
        Ok(SMatrix::from_row_slice(&values))
    }

    fn read_exact(&self, key: &str, expected: usize) -> Result<Vec<f64>, ConfigErrors> {
        let values = self.source.read_doubles(self.section, key)?;
        if values.len() != expected {
            return Err(ConfigErrors::LengthMismatch {
                section: self.section.to_string(),
                key: key.to_string(),
                expected,
                found: values.len(),
            });
        }
        Ok(values)
    }

    /// Reads `prescaler`, clamped to at least one.
    pub fn prescaler(&mut self) -> Result<u64, ConfigErrors> {
        let raw = self.read_int("prescaler")?;
        Ok(self.record(resolve_prescaler(raw)))
    }

    /// Reads `reference_sat_id`, replacing negative values with `fallback`.
    pub fn reference_sat_id(&mut self, fallback: i64) -> Result<i64, ConfigErrors> {
        let raw = self.read_int("reference_sat_id")?;
        Ok(self.record(resolve_reference_sat_id(raw, fallback)))
    }

    pub fn selection<S: Selection>(&mut self, key: &str) -> Result<S, ConfigErrors> {
        let raw = self.read_string(key)?;
        Ok(self.record(resolve_selection(self.section, key, &raw)))
    }

    fn record<T>(&mut self, field: Field<T>) -> T {
        let (value, diagnostic) = field.into_parts();
        self.diagnostics.extend(diagnostic);
        value
    }

    pub fn finish<T>(self, value: T) -> Loaded<T> {
        Loaded {
            value,
            diagnostics: self.diagnostics,
        }
    }
}
