use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioErrors {
    #[error("failed to read scenario '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("chief and deputy share sat_id {0}")]
    DuplicateSatId(usize),
}

/// Circular equatorial orbit.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct OrbitScenario {
    pub altitude_m: f64,
    /// Argument of latitude at t = 0
    #[serde(default)]
    pub phase_deg: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChiefScenario {
    #[serde(default)]
    pub sat_id: usize,
    pub orbit: OrbitScenario,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DeputyScenario {
    #[serde(default = "default_deputy_id")]
    pub sat_id: usize,
    /// Spacecraft file listing the instrument files
    pub file: PathBuf,
    pub mass_kg: f64,
    pub orbit: OrbitScenario,
}

fn default_deputy_id() -> usize {
    1
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Scenario {
    pub step_time_s: f64,
    pub steps: u64,
    pub chief: ChiefScenario,
    pub deputy: DeputyScenario,
}

impl Scenario {
    /// Reads a scenario; the deputy file is resolved against the scenario's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioErrors> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ScenarioErrors::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario: Scenario = toml::from_str(&contents)?;
        if scenario.chief.sat_id == scenario.deputy.sat_id {
            return Err(ScenarioErrors::DuplicateSatId(scenario.chief.sat_id));
        }
        if let Some(dir) = path.parent() {
            scenario.deputy.file = dir.join(&scenario.deputy.file);
        }
        log::debug!("loaded scenario '{}'", path.display());
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        step_time_s = 0.5
        steps = 20

        [chief.orbit]
        altitude_m = 500e3

        [deputy]
        file = "deputy.toml"
        mass_kg = 50.0

        [deputy.orbit]
        altitude_m = 500e3
        phase_deg = -0.001
    "#;

    #[test]
    fn test_load_resolves_deputy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, SCENARIO).unwrap();
        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.steps, 20);
        assert_eq!(scenario.chief.sat_id, 0);
        assert_eq!(scenario.chief.orbit.phase_deg, 0.0);
        assert_eq!(scenario.deputy.sat_id, 1);
        assert_eq!(scenario.deputy.file, dir.path().join("deputy.toml"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, SCENARIO.replace("file =", "sat_id = 0\n        file =")).unwrap();
        assert!(matches!(
            Scenario::load(&path),
            Err(ScenarioErrors::DuplicateSatId(0))
        ));
    }
}
