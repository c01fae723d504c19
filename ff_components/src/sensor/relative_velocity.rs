use std::{fmt, io::Write, path::Path};

use ff_config::{ConfigErrors, ConfigFile, ConfigurationSource, Loaded, SectionReader, Selection};
use ff_result::{FfResult, ResultErrors, ResultId, ResultManager};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::{RelativeSensorConfig, SensorBase, SensorErrors, read_sensor_information};
use crate::{
    clock::{ClockGenerator, Component},
    environment::{Dynamics, RelativeInformation},
};

pub const SECTION: &str = "RELATIVE_VELOCITY_SENSOR";

/// Frame in which measurement errors are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeVelocityErrorFrame {
    Inertial,
    Rtn,
}

impl fmt::Display for RelativeVelocityErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inertial => write!(f, "INERTIAL"),
            Self::Rtn => write!(f, "RTN"),
        }
    }
}

impl Selection for RelativeVelocityErrorFrame {
    const DEFAULT: Self = Self::Rtn;

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "INERTIAL" => Some(Self::Inertial),
            "RTN" => Some(Self::Rtn),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RelativeVelocitySensorConfig {
    pub sensor: RelativeSensorConfig,
    pub error_frame: RelativeVelocityErrorFrame,
}

impl RelativeVelocitySensorConfig {
    pub fn load(
        source: &dyn ConfigurationSource,
        reference_sat_id_input: i64,
    ) -> Result<Loaded<Self>, ConfigErrors> {
        let mut reader = SectionReader::new(source, SECTION);
        let sensor = RelativeSensorConfig::read(&mut reader, reference_sat_id_input)?;
        let error_frame = reader.selection("error_frame")?;
        Ok(reader.finish(Self {
            sensor,
            error_frame,
        }))
    }
}

/// Measures the velocity of a target spacecraft relative to a reference one.
pub struct RelativeVelocitySensor<'a> {
    config: RelativeVelocitySensorConfig,
    sensor_base: SensorBase<3>,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    measured_velocity_inertial_m_s: Vector3<f64>,
    measured_velocity_rtn_m_s: Vector3<f64>,
    measured_velocity_body_m_s: Vector3<f64>,
    result_id: Option<ResultId>,
}

impl<'a> RelativeVelocitySensor<'a> {
    pub fn new(
        config: RelativeVelocitySensorConfig,
        sensor_base: SensorBase<3>,
        relative_information: &'a dyn RelativeInformation,
        dynamics: &'a dyn Dynamics,
    ) -> Self {
        Self {
            config,
            sensor_base,
            relative_information,
            dynamics,
            measured_velocity_inertial_m_s: Vector3::zeros(),
            measured_velocity_rtn_m_s: Vector3::zeros(),
            measured_velocity_body_m_s: Vector3::zeros(),
            result_id: None,
        }
    }

    /// Builds the sensor from its section and registers it with the clock.
    pub fn from_config(
        clock: &mut ClockGenerator,
        source: &dyn ConfigurationSource,
        step_time_s: f64,
        relative_information: &'a dyn RelativeInformation,
        dynamics: &'a dyn Dynamics,
        reference_sat_id_input: i64,
    ) -> Result<Self, SensorErrors> {
        let config = RelativeVelocitySensorConfig::load(source, reference_sat_id_input)?.emit();
        let prescaler = config.sensor.prescaler;
        let sensor_base =
            read_sensor_information(source, step_time_s * prescaler as f64, SECTION, "m_s")?;
        clock.register(SECTION, prescaler);
        Ok(Self::new(config, sensor_base, relative_information, dynamics))
    }

    pub fn config(&self) -> &RelativeVelocitySensorConfig {
        &self.config
    }

    pub fn prescaler(&self) -> u64 {
        self.config.sensor.prescaler
    }

    pub fn target_sat_id(&self) -> i64 {
        self.config.sensor.target_sat_id
    }

    pub fn reference_sat_id(&self) -> i64 {
        self.config.sensor.reference_sat_id
    }

    pub fn error_frame(&self) -> RelativeVelocityErrorFrame {
        self.config.error_frame
    }

    pub fn dynamics(&self) -> &'a dyn Dynamics {
        self.dynamics
    }

    pub fn measured_velocity_inertial_m_s(&self) -> &Vector3<f64> {
        &self.measured_velocity_inertial_m_s
    }

    pub fn measured_velocity_rtn_m_s(&self) -> &Vector3<f64> {
        &self.measured_velocity_rtn_m_s
    }

    pub fn measured_velocity_body_m_s(&self) -> &Vector3<f64> {
        &self.measured_velocity_body_m_s
    }

    fn measure(&mut self) {
        let target = self.target_sat_id();
        let reference = self.reference_sat_id();
        let rel = self.relative_information;
        let true_inertial = rel.relative_velocity_inertial_m_s(target, reference);
        let true_rtn = rel.relative_velocity_rtn_m_s(target, reference);
        let dcm = rel.dcm_inertial_to_rtn(reference);

        // errors are applied in the configured frame and rotated into the other
        match self.config.error_frame {
            RelativeVelocityErrorFrame::Inertial => {
                let measured = self.sensor_base.measure(&true_inertial);
                self.measured_velocity_inertial_m_s = measured;
                self.measured_velocity_rtn_m_s = true_rtn + dcm * (measured - true_inertial);
            }
            RelativeVelocityErrorFrame::Rtn => {
                let measured = self.sensor_base.measure(&true_rtn);
                self.measured_velocity_rtn_m_s = measured;
                self.measured_velocity_inertial_m_s =
                    true_inertial + dcm.transpose() * (measured - true_rtn);
            }
        }
        self.measured_velocity_body_m_s = self
            .dynamics
            .quaternion_inertial_to_body()
            .transform_vector(&self.measured_velocity_inertial_m_s);
    }
}

impl Component for RelativeVelocitySensor<'_> {
    fn prescaler(&self) -> u64 {
        self.config.sensor.prescaler
    }

    fn main_routine(&mut self, _count: u64) {
        self.measure();
    }
}

impl FfResult for RelativeVelocitySensor<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let id = results.new_entry(
            "relative_velocity_sensor",
            &[
                "measured_velocity_inertial[x](m/s)",
                "measured_velocity_inertial[y](m/s)",
                "measured_velocity_inertial[z](m/s)",
                "measured_velocity_rtn[x](m/s)",
                "measured_velocity_rtn[y](m/s)",
                "measured_velocity_rtn[z](m/s)",
            ],
        )?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        if let Some(id) = self.result_id {
            let v = &self.measured_velocity_inertial_m_s;
            let rtn = &self.measured_velocity_rtn_m_s;
            results.write_record(
                id,
                &[
                    v[0].to_string(),
                    v[1].to_string(),
                    v[2].to_string(),
                    rtn[0].to_string(),
                    rtn[1].to_string(),
                    rtn[2].to_string(),
                ],
            )?;
        }
        Ok(())
    }
}

/// Reads `RELATIVE_VELOCITY_SENSOR` from `file_name`. A negative
/// `reference_sat_id` selects `reference_sat_id_input`.
pub fn initialize_relative_velocity_sensor<'a>(
    clock: &mut ClockGenerator,
    file_name: impl AsRef<Path>,
    step_time_s: f64,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    reference_sat_id_input: i64,
) -> Result<RelativeVelocitySensor<'a>, SensorErrors> {
    let file = ConfigFile::open(file_name)?;
    RelativeVelocitySensor::from_config(
        clock,
        &file,
        step_time_s,
        relative_information,
        dynamics,
        reference_sat_id_input,
    )
}
