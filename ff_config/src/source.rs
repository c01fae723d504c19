use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use toml::{Table, Value};

use crate::ConfigErrors;

/// Typed read access to `key` within `section`.
///
/// Missing sections and keys are errors; implementations never substitute
/// defaults on their own.
pub trait ConfigurationSource {
    fn contains(&self, section: &str, key: &str) -> bool;
    fn read_int(&self, section: &str, key: &str) -> Result<i64, ConfigErrors>;
    fn read_double(&self, section: &str, key: &str) -> Result<f64, ConfigErrors>;
    fn read_string(&self, section: &str, key: &str) -> Result<String, ConfigErrors>;
    /// Reads a numeric array. A bare number reads as a one element array.
    fn read_doubles(&self, section: &str, key: &str) -> Result<Vec<f64>, ConfigErrors>;
}

/// A TOML document where every top-level table is a section.
///
/// ```toml
/// [RELATIVE_VELOCITY_SENSOR]
/// prescaler = 10
/// error_frame = "RTN"
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigFile {
    path: Option<PathBuf>,
    table: Table,
}

impl ConfigFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigErrors> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigErrors::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::from_str(&contents)?;
        file.path = Some(path.to_path_buf());
        log::debug!("loaded configuration '{}'", path.display());
        Ok(file)
    }

    /// Path the file was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.table
            .iter()
            .filter(|(_, value)| value.is_table())
            .map(|(name, _)| name.as_str())
    }

    fn value(&self, section: &str, key: &str) -> Result<&Value, ConfigErrors> {
        let table = self
            .table
            .get(section)
            .and_then(Value::as_table)
            .ok_or_else(|| ConfigErrors::SectionNotFound(section.to_string()))?;
        table.get(key).ok_or_else(|| ConfigErrors::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        })
    }
}

impl FromStr for ConfigFile {
    type Err = ConfigErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            path: None,
            table: s.parse::<Table>()?,
        })
    }
}

fn mismatch(section: &str, key: &str, expected: &'static str) -> ConfigErrors {
    ConfigErrors::TypeMismatch {
        section: section.to_string(),
        key: key.to_string(),
        expected,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

impl ConfigurationSource for ConfigFile {
    fn contains(&self, section: &str, key: &str) -> bool {
        self.value(section, key).is_ok()
    }

    fn read_int(&self, section: &str, key: &str) -> Result<i64, ConfigErrors> {
        self.value(section, key)?
            .as_integer()
            .ok_or_else(|| mismatch(section, key, "an integer"))
    }

    fn read_double(&self, section: &str, key: &str) -> Result<f64, ConfigErrors> {
        as_number(self.value(section, key)?).ok_or_else(|| mismatch(section, key, "a number"))
    }

    fn read_string(&self, section: &str, key: &str) -> Result<String, ConfigErrors> {
        self.value(section, key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(section, key, "a string"))
    }

    fn read_doubles(&self, section: &str, key: &str) -> Result<Vec<f64>, ConfigErrors> {
        match self.value(section, key)? {
            Value::Array(values) => values
                .iter()
                .map(|v| as_number(v).ok_or_else(|| mismatch(section, key, "a numeric array")))
                .collect(),
            value => as_number(value)
                .map(|v| vec![v])
                .ok_or_else(|| mismatch(section, key, "a numeric array")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [RELATIVE_VELOCITY_SENSOR]
        prescaler = 10
        error_frame = "RTN"
        constant_bias_c_m_s = [0.1, 0, -0.1]
        range_to_zero_c_m = 5.0
    "#;

    #[test]
    fn test_typed_reads() {
        let file: ConfigFile = SAMPLE.parse().unwrap();
        let section = "RELATIVE_VELOCITY_SENSOR";
        assert_eq!(file.read_int(section, "prescaler").unwrap(), 10);
        assert_eq!(file.read_string(section, "error_frame").unwrap(), "RTN");
        assert_eq!(file.read_double(section, "prescaler").unwrap(), 10.0);
        assert_eq!(
            file.read_doubles(section, "constant_bias_c_m_s").unwrap(),
            vec![0.1, 0.0, -0.1]
        );
        assert_eq!(file.read_doubles(section, "range_to_zero_c_m").unwrap(), vec![5.0]);
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let file: ConfigFile = SAMPLE.parse().unwrap();
        let err = file
            .read_int("RELATIVE_VELOCITY_SENSOR", "target_sat_id")
            .unwrap_err();
        assert!(matches!(err, ConfigErrors::KeyNotFound { .. }));
        assert!(!file.contains("RELATIVE_VELOCITY_SENSOR", "target_sat_id"));

        let err = file.read_int("FORCE_GENERATOR", "prescaler").unwrap_err();
        assert!(matches!(err, ConfigErrors::SectionNotFound(s) if s == "FORCE_GENERATOR"));
    }

    #[test]
    fn test_type_mismatch() {
        let file: ConfigFile = SAMPLE.parse().unwrap();
        let err = file
            .read_int("RELATIVE_VELOCITY_SENSOR", "error_frame")
            .unwrap_err();
        assert!(matches!(err, ConfigErrors::TypeMismatch { expected: "an integer", .. }));
    }

    #[test]
    fn test_open_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();
        let file = ConfigFile::open(tmp.path()).unwrap();
        assert_eq!(file.path(), Some(tmp.path()));
        assert_eq!(file.sections().collect::<Vec<_>>(), vec!["RELATIVE_VELOCITY_SENSOR"]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = ConfigFile::open("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigErrors::Io { .. }));
    }
}
