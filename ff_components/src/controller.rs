use std::{io::Write, path::Path};

use ff_config::{ConfigErrors, ConfigFile, ConfigurationSource, Loaded, SectionReader};
use ff_result::{FfResult, ResultErrors, ResultId, ResultManager};
use nalgebra::Vector3;
use serde::Serialize;
use thiserror::Error;

use crate::{
    actuator::force_generator::ForceGenerator,
    clock::{ClockGenerator, is_due},
    environment::Structure,
    sensor::{relative_position::RelativePositionSensor, relative_velocity::RelativeVelocitySensor},
};

pub const SECTION: &str = "RELATIVE_ORBIT_CONTROLLER";

#[derive(Debug, Error)]
pub enum ControllerErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("[RELATIVE_ORBIT_CONTROLLER] max_force_N must be positive, got {0}")]
    NonPositiveMaxForce(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RelativeOrbitControllerConfig {
    pub prescaler: u64,
    pub target_relative_position_rtn_m: Vector3<f64>,
    /// Per-axis gains in acceleration per meter and per meter/second
    pub p_gain: Vector3<f64>,
    pub d_gain: Vector3<f64>,
    pub max_force_n: f64,
}

impl RelativeOrbitControllerConfig {
    pub fn load(source: &dyn ConfigurationSource) -> Result<Loaded<Self>, ConfigErrors> {
        let mut reader = SectionReader::new(source, SECTION);
        let prescaler = reader.prescaler()?;
        let target_relative_position_rtn_m = reader.read_vector("target_relative_position_rtn_m")?;
        let p_gain = reader.read_vector("p_gain")?;
        let d_gain = reader.read_vector("d_gain")?;
        let max_force_n = reader.read_double("max_force_N")?;
        Ok(reader.finish(Self {
            prescaler,
            target_relative_position_rtn_m,
            p_gain,
            d_gain,
            max_force_n,
        }))
    }
}

/// Keeps the sensors' target at a fixed offset in the RTN frame by thrusting
/// this spacecraft, which is the sensors' reference.
///
/// With `r` the measured position of the target relative to this spacecraft,
/// pushing this spacecraft along `r` closes the gap, so the commanded force is
/// `m (p ∘ (r - r_target) + d ∘ v)`, saturated at `max_force_N`.
pub struct RelativeOrbitController<'a> {
    config: RelativeOrbitControllerConfig,
    structure: &'a dyn Structure,
    commanded_force_rtn_n: Vector3<f64>,
    result_id: Option<ResultId>,
}

impl<'a> RelativeOrbitController<'a> {
    pub fn new(
        config: RelativeOrbitControllerConfig,
        structure: &'a dyn Structure,
    ) -> Result<Self, ControllerErrors> {
        if config.max_force_n <= 0.0 {
            return Err(ControllerErrors::NonPositiveMaxForce(config.max_force_n));
        }
        Ok(Self {
            config,
            structure,
            commanded_force_rtn_n: Vector3::zeros(),
            result_id: None,
        })
    }

    pub fn from_config(
        clock: &mut ClockGenerator,
        source: &dyn ConfigurationSource,
        structure: &'a dyn Structure,
    ) -> Result<Self, ControllerErrors> {
        let config = RelativeOrbitControllerConfig::load(source)?.emit();
        let controller = Self::new(config, structure)?;
        clock.register(SECTION, config.prescaler);
        Ok(controller)
    }

    pub fn config(&self) -> &RelativeOrbitControllerConfig {
        &self.config
    }

    pub fn prescaler(&self) -> u64 {
        self.config.prescaler
    }

    pub fn commanded_force_rtn_n(&self) -> &Vector3<f64> {
        &self.commanded_force_rtn_n
    }

    /// Saturated PD force for a relative position and velocity in RTN.
    pub fn control_force_rtn_n(
        &self,
        position_rtn_m: &Vector3<f64>,
        velocity_rtn_m_s: &Vector3<f64>,
    ) -> Vector3<f64> {
        let error = position_rtn_m - self.config.target_relative_position_rtn_m;
        let acceleration =
            self.config.p_gain.component_mul(&error) + self.config.d_gain.component_mul(velocity_rtn_m_s);
        let force = acceleration * self.structure.mass_kg();
        let norm = force.norm();
        if norm > self.config.max_force_n {
            force * (self.config.max_force_n / norm)
        } else {
            force
        }
    }

    /// Reads the latest measurements and commands the force generator when due.
    pub fn update(
        &mut self,
        count: u64,
        position_sensor: &RelativePositionSensor<'_>,
        velocity_sensor: &RelativeVelocitySensor<'_>,
        force_generator: &mut ForceGenerator<'_>,
    ) {
        if !is_due(count, self.config.prescaler) {
            return;
        }
        self.commanded_force_rtn_n = self.control_force_rtn_n(
            position_sensor.measured_position_rtn_m(),
            velocity_sensor.measured_velocity_rtn_m_s(),
        );
        force_generator.set_force_rtn_n(self.commanded_force_rtn_n);
    }
}

impl FfResult for RelativeOrbitController<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let id = results.new_entry(
            "relative_orbit_controller",
            &[
                "commanded_force_rtn[x](N)",
                "commanded_force_rtn[y](N)",
                "commanded_force_rtn[z](N)",
            ],
        )?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let Some(id) = self.result_id else {
            return Ok(());
        };
        let content: Vec<String> = self.commanded_force_rtn_n.iter().map(|x| x.to_string()).collect();
        results.write_record(id, &content)
    }
}

pub fn initialize_relative_orbit_controller<'a>(
    clock: &mut ClockGenerator,
    file_name: impl AsRef<Path>,
    structure: &'a dyn Structure,
) -> Result<RelativeOrbitController<'a>, ControllerErrors> {
    let file = ConfigFile::open(file_name)?;
    RelativeOrbitController::from_config(clock, &file, structure)
}
