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

pub const SECTION: &str = "RELATIVE_POSITION_SENSOR";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativePositionErrorFrame {
    Inertial,
    Rtn,
    Body,
}

impl fmt::Display for RelativePositionErrorFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inertial => write!(f, "INERTIAL"),
            Self::Rtn => write!(f, "RTN"),
            Self::Body => write!(f, "BODY"),
        }
    }
}

impl Selection for RelativePositionErrorFrame {
    const DEFAULT: Self = Self::Rtn;

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "INERTIAL" => Some(Self::Inertial),
            "RTN" => Some(Self::Rtn),
            "BODY" => Some(Self::Body),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RelativePositionSensorConfig {
    pub sensor: RelativeSensorConfig,
    pub error_frame: RelativePositionErrorFrame,
}

impl RelativePositionSensorConfig {
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

pub struct RelativePositionSensor<'a> {
    config: RelativePositionSensorConfig,
    sensor_base: SensorBase<3>,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    measured_position_inertial_m: Vector3<f64>,
    measured_position_rtn_m: Vector3<f64>,
    measured_position_body_m: Vector3<f64>,
    result_id: Option<ResultId>,
}

impl<'a> RelativePositionSensor<'a> {
    pub fn new(
        config: RelativePositionSensorConfig,
        sensor_base: SensorBase<3>,
        relative_information: &'a dyn RelativeInformation,
        dynamics: &'a dyn Dynamics,
    ) -> Self {
        Self {
            config,
            sensor_base,
            relative_information,
            dynamics,
            measured_position_inertial_m: Vector3::zeros(),
            measured_position_rtn_m: Vector3::zeros(),
            measured_position_body_m: Vector3::zeros(),
            result_id: None,
        }
    }

    pub fn from_config(
        clock: &mut ClockGenerator,
        source: &dyn ConfigurationSource,
        step_time_s: f64,
        relative_information: &'a dyn RelativeInformation,
        dynamics: &'a dyn Dynamics,
        reference_sat_id_input: i64,
    ) -> Result<Self, SensorErrors> {
        let config = RelativePositionSensorConfig::load(source, reference_sat_id_input)?.emit();
        let prescaler = config.sensor.prescaler;
        let sensor_base =
            read_sensor_information(source, step_time_s * prescaler as f64, SECTION, "m")?;
        clock.register(SECTION, prescaler);
        Ok(Self::new(config, sensor_base, relative_information, dynamics))
    }

    pub fn config(&self) -> &RelativePositionSensorConfig {
        &self.config
    }

    pub fn target_sat_id(&self) -> i64 {
        self.config.sensor.target_sat_id
    }

    pub fn reference_sat_id(&self) -> i64 {
        self.config.sensor.reference_sat_id
    }

    pub fn error_frame(&self) -> RelativePositionErrorFrame {
        self.config.error_frame
    }

    pub fn measured_position_inertial_m(&self) -> &Vector3<f64> {
        &self.measured_position_inertial_m
    }

    pub fn measured_position_rtn_m(&self) -> &Vector3<f64> {
        &self.measured_position_rtn_m
    }

    pub fn measured_position_body_m(&self) -> &Vector3<f64> {
        &self.measured_position_body_m
    }

    fn measure(&mut self) {
        let target = self.target_sat_id();
        let reference = self.reference_sat_id();
        let rel = self.relative_information;
        let true_inertial = rel.relative_position_inertial_m(target, reference);
        let true_rtn = rel.relative_position_rtn_m(target, reference);
        let dcm = rel.dcm_inertial_to_rtn(reference);
        let attitude = self.dynamics.quaternion_inertial_to_body();

        let measured_inertial = match self.config.error_frame {
            RelativePositionErrorFrame::Inertial => self.sensor_base.measure(&true_inertial),
            RelativePositionErrorFrame::Rtn => {
                let measured = self.sensor_base.measure(&true_rtn);
                true_inertial + dcm.transpose() * (measured - true_rtn)
            }
            RelativePositionErrorFrame::Body => {
                let true_body = attitude.transform_vector(&true_inertial);
                let measured = self.sensor_base.measure(&true_body);
                true_inertial + attitude.inverse_transform_vector(&(measured - true_body))
            }
        };

        self.measured_position_inertial_m = measured_inertial;
        self.measured_position_rtn_m = true_rtn + dcm * (measured_inertial - true_inertial);
        self.measured_position_body_m = attitude.transform_vector(&measured_inertial);
    }
}

impl Component for RelativePositionSensor<'_> {
    fn prescaler(&self) -> u64 {
        self.config.sensor.prescaler
    }

    fn main_routine(&mut self, _count: u64) {
        self.measure();
    }
}

impl FfResult for RelativePositionSensor<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let id = results.new_entry(
            "relative_position_sensor",
            &[
                "measured_position_inertial[x](m)",
                "measured_position_inertial[y](m)",
                "measured_position_inertial[z](m)",
                "measured_position_rtn[x](m)",
                "measured_position_rtn[y](m)",
                "measured_position_rtn[z](m)",
                "measured_position_body[x](m)",
                "measured_position_body[y](m)",
                "measured_position_body[z](m)",
            ],
        )?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let Some(id) = self.result_id else {
            return Ok(());
        };
        let content: Vec<String> = [
            &self.measured_position_inertial_m,
            &self.measured_position_rtn_m,
            &self.measured_position_body_m,
        ]
        .into_iter()
        .flat_map(|v| v.iter().map(|x| x.to_string()))
        .collect();
        results.write_record(id, &content)
    }
}

pub fn initialize_relative_position_sensor<'a>(
    clock: &mut ClockGenerator,
    file_name: impl AsRef<Path>,
    step_time_s: f64,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    reference_sat_id_input: i64,
) -> Result<RelativePositionSensor<'a>, SensorErrors> {
    let file = ConfigFile::open(file_name)?;
    RelativePositionSensor::from_config(
        clock,
        &file,
        step_time_s,
        relative_information,
        dynamics,
        reference_sat_id_input,
    )
}
