//! Instrument set of a formation-flying spacecraft.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use ff_config::{ConfigErrors, ConfigFile, SectionReader};
use ff_result::{FfResult, ResultErrors, ResultManager};
use nalgebra::Vector3;

use crate::{
    ComponentErrors,
    actuator::{
        Actuator,
        force_generator::{ForceGenerator, initialize_force_generator},
        total_force_body_n, total_torque_body_nm,
    },
    analyzer::RelativeOrbitAnalyzer,
    cdh::OnBoardComputer,
    clock::{ClockGenerator, Component},
    controller::{RelativeOrbitController, initialize_relative_orbit_controller},
    environment::{
        Dynamics, GlobalEnvironment, LocalEnvironment, RelativeInformation,
        SimulationConfiguration, Structure,
    },
    sensor::{
        relative_distance::{RelativeDistanceSensor, initialize_relative_distance_sensor},
        relative_position::{RelativePositionSensor, initialize_relative_position_sensor},
        relative_velocity::{RelativeVelocitySensor, initialize_relative_velocity_sensor},
    },
};

/// Simulation state a spacecraft's components read. Everything here is owned
/// by the spacecraft or the simulation and outlives the components.
#[derive(Clone, Copy)]
pub struct SpacecraftReferences<'a> {
    pub dynamics: &'a dyn Dynamics,
    pub structure: &'a dyn Structure,
    pub local_environment: &'a dyn LocalEnvironment,
    pub global_environment: &'a dyn GlobalEnvironment,
    pub simulation_configuration: &'a dyn SimulationConfiguration,
    pub relative_information: &'a dyn RelativeInformation,
}

/// Instrument files listed in the `[COMPONENT_FILES]` section of a spacecraft
/// file. Relative paths are taken from the spacecraft file's directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentFiles {
    pub relative_distance_sensor: PathBuf,
    pub relative_position_sensor: PathBuf,
    pub relative_velocity_sensor: PathBuf,
    pub force_generator: PathBuf,
    pub relative_orbit_controller: PathBuf,
}

impl ComponentFiles {
    pub const SECTION: &'static str = "COMPONENT_FILES";

    pub fn load(spacecraft_file: &ConfigFile) -> Result<Self, ConfigErrors> {
        let base = spacecraft_file
            .path()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let reader = SectionReader::new(spacecraft_file, Self::SECTION);
        let path = |key: &str| -> Result<PathBuf, ConfigErrors> { Ok(base.join(reader.read_string(key)?)) };
        Ok(Self {
            relative_distance_sensor: path("relative_distance_sensor_file")?,
            relative_position_sensor: path("relative_position_sensor_file")?,
            relative_velocity_sensor: path("relative_velocity_sensor_file")?,
            force_generator: path("force_generator_file")?,
            relative_orbit_controller: path("relative_orbit_controller_file")?,
        })
    }
}

/// What the rest of the simulation sees of a spacecraft's instruments.
pub trait InstalledComponents {
    /// Sum of actuator forces in the body frame
    fn generate_force_body_frame(&self) -> Vector3<f64> {
        Vector3::zeros()
    }

    /// Sum of actuator torques in the body frame
    fn generate_torque_body_frame(&self) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn register_logging<W: Write>(&mut self, _results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        Ok(())
    }
}

/// Components of a formation-flying spacecraft.
///
/// Fields drop in declaration order, which is the reverse of construction:
/// the analyzer and controller go before the sensors and actuator they use.
pub struct FfComponents<'a> {
    relative_orbit_analyzer: RelativeOrbitAnalyzer<'a>,
    relative_orbit_controller: RelativeOrbitController<'a>,
    force_generator: ForceGenerator<'a>,
    relative_velocity_sensor: RelativeVelocitySensor<'a>,
    relative_position_sensor: RelativePositionSensor<'a>,
    relative_distance_sensor: RelativeDistanceSensor<'a>,
    obc: OnBoardComputer,
    references: SpacecraftReferences<'a>,
}

impl<'a> FfComponents<'a> {
    /// Builds every instrument of spacecraft `sat_id` from the files its
    /// spacecraft file lists. Sensors whose `reference_sat_id` is negative
    /// use `sat_id`.
    pub fn new(
        references: SpacecraftReferences<'a>,
        clock: &mut ClockGenerator,
        sat_id: usize,
    ) -> Result<Self, ComponentErrors> {
        let spacecraft_file = references
            .simulation_configuration
            .spacecraft_file(sat_id)
            .ok_or(ComponentErrors::SpacecraftFileNotFound(sat_id))?;
        let files = ComponentFiles::load(&ConfigFile::open(&spacecraft_file)?)?;
        log::info!(
            "building components of spacecraft {sat_id} from '{}'",
            spacecraft_file.display()
        );

        let step_time_s = references.global_environment.component_step_time_s();
        let reference_sat_id = sat_id as i64;
        let relative_information = references.relative_information;
        let dynamics = references.dynamics;

        let obc = OnBoardComputer::new(clock);
        let relative_distance_sensor = initialize_relative_distance_sensor(
            clock,
            &files.relative_distance_sensor,
            step_time_s,
            relative_information,
            dynamics,
            reference_sat_id,
        )?;
        let relative_position_sensor = initialize_relative_position_sensor(
            clock,
            &files.relative_position_sensor,
            step_time_s,
            relative_information,
            dynamics,
            reference_sat_id,
        )?;
        let relative_velocity_sensor = initialize_relative_velocity_sensor(
            clock,
            &files.relative_velocity_sensor,
            step_time_s,
            relative_information,
            dynamics,
            reference_sat_id,
        )?;
        let force_generator = initialize_force_generator(clock, &files.force_generator, dynamics)?;
        let relative_orbit_controller = initialize_relative_orbit_controller(
            clock,
            &files.relative_orbit_controller,
            references.structure,
        )?;
        let relative_orbit_analyzer =
            RelativeOrbitAnalyzer::new(clock, relative_information, &relative_velocity_sensor);

        Ok(Self {
            relative_orbit_analyzer,
            relative_orbit_controller,
            force_generator,
            relative_velocity_sensor,
            relative_position_sensor,
            relative_distance_sensor,
            obc,
            references,
        })
    }

    /// Runs every component due on tick `count`, in construction order.
    pub fn tick(&mut self, count: u64) {
        self.obc.tick(count);
        self.relative_distance_sensor.tick(count);
        self.relative_position_sensor.tick(count);
        self.relative_velocity_sensor.tick(count);
        self.relative_orbit_controller.update(
            count,
            &self.relative_position_sensor,
            &self.relative_velocity_sensor,
            &mut self.force_generator,
        );
        self.force_generator.tick(count);
        self.relative_orbit_analyzer.update(
            &self.relative_distance_sensor,
            &self.relative_position_sensor,
            &self.relative_velocity_sensor,
        );
    }

    /// Fills the current result row. The caller writes the row.
    pub fn write_results<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        self.relative_distance_sensor.write_result(results)?;
        self.relative_position_sensor.write_result(results)?;
        self.relative_velocity_sensor.write_result(results)?;
        self.force_generator.write_result(results)?;
        self.relative_orbit_controller.write_result(results)?;
        self.relative_orbit_analyzer.write_result(results)
    }

    pub fn actuators(&self) -> [&dyn Actuator; 1] {
        [&self.force_generator]
    }

    pub fn obc(&self) -> &OnBoardComputer {
        &self.obc
    }

    pub fn relative_distance_sensor(&self) -> &RelativeDistanceSensor<'a> {
        &self.relative_distance_sensor
    }

    pub fn relative_position_sensor(&self) -> &RelativePositionSensor<'a> {
        &self.relative_position_sensor
    }

    pub fn relative_velocity_sensor(&self) -> &RelativeVelocitySensor<'a> {
        &self.relative_velocity_sensor
    }

    pub fn force_generator(&self) -> &ForceGenerator<'a> {
        &self.force_generator
    }

    pub fn force_generator_mut(&mut self) -> &mut ForceGenerator<'a> {
        &mut self.force_generator
    }

    pub fn relative_orbit_controller(&self) -> &RelativeOrbitController<'a> {
        &self.relative_orbit_controller
    }

    pub fn relative_orbit_analyzer(&self) -> &RelativeOrbitAnalyzer<'a> {
        &self.relative_orbit_analyzer
    }

    pub fn dynamics(&self) -> &'a dyn Dynamics {
        self.references.dynamics
    }

    pub fn structure(&self) -> &'a dyn Structure {
        self.references.structure
    }

    pub fn local_environment(&self) -> &'a dyn LocalEnvironment {
        self.references.local_environment
    }

    pub fn global_environment(&self) -> &'a dyn GlobalEnvironment {
        self.references.global_environment
    }

    pub fn simulation_configuration(&self) -> &'a dyn SimulationConfiguration {
        self.references.simulation_configuration
    }

    pub fn relative_information(&self) -> &'a dyn RelativeInformation {
        self.references.relative_information
    }
}

impl InstalledComponents for FfComponents<'_> {
    fn generate_force_body_frame(&self) -> Vector3<f64> {
        total_force_body_n(&self.actuators())
    }

    fn generate_torque_body_frame(&self) -> Vector3<f64> {
        total_torque_body_nm(&self.actuators())
    }

    /// The on-board computer has nothing to log; the others register in
    /// construction order.
    fn register_logging<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        self.relative_distance_sensor.new_result(results)?;
        self.relative_position_sensor.new_result(results)?;
        self.relative_velocity_sensor.new_result(results)?;
        self.force_generator.new_result(results)?;
        self.relative_orbit_controller.new_result(results)?;
        self.relative_orbit_analyzer.new_result(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_files_resolve_against_spacecraft_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deputy.toml");
        std::fs::write(
            &path,
            r#"
            [COMPONENT_FILES]
            relative_distance_sensor_file = "sensors/distance.toml"
            relative_position_sensor_file = "sensors/position.toml"
            relative_velocity_sensor_file = "/abs/velocity.toml"
            force_generator_file = "force_generator.toml"
            relative_orbit_controller_file = "controller.toml"
            "#,
        )
        .unwrap();
        let files = ComponentFiles::load(&ConfigFile::open(&path).unwrap()).unwrap();
        assert_eq!(files.relative_distance_sensor, dir.path().join("sensors/distance.toml"));
        assert_eq!(files.relative_velocity_sensor, PathBuf::from("/abs/velocity.toml"));
        assert_eq!(files.force_generator, dir.path().join("force_generator.toml"));
    }

    #[test]
    fn test_missing_component_file_key_is_fatal() {
        let file: ConfigFile = "[COMPONENT_FILES]\nforce_generator_file = \"f.toml\"".parse().unwrap();
        assert!(matches!(
            ComponentFiles::load(&file),
            Err(ConfigErrors::KeyNotFound { .. })
        ));
    }

    struct NoComponents;

    impl InstalledComponents for NoComponents {}

    #[test]
    fn test_default_installed_components_are_inert() {
        let mut none = NoComponents;
        let mut results = ResultManager::from_writer(Vec::new());
        none.register_logging(&mut results).unwrap();
        assert!(results.headers().is_empty());
        assert_eq!(none.generate_force_body_frame(), Vector3::zeros());
        assert_eq!(none.generate_torque_body_frame(), Vector3::zeros());
    }
}
