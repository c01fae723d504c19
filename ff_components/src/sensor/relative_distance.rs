use std::{io::Write, path::Path};

use ff_config::{ConfigErrors, ConfigFile, ConfigurationSource, Loaded, SectionReader};
use ff_result::{FfResult, ResultErrors, ResultId, ResultManager};
use nalgebra::Vector1;

use super::{RelativeSensorConfig, SensorBase, SensorErrors, read_sensor_information};
use crate::{
    clock::{ClockGenerator, Component},
    environment::{Dynamics, RelativeInformation},
};

pub const SECTION: &str = "RELATIVE_DISTANCE_SENSOR";

pub fn load_config(
    source: &dyn ConfigurationSource,
    reference_sat_id_input: i64,
) -> Result<Loaded<RelativeSensorConfig>, ConfigErrors> {
    let mut reader = SectionReader::new(source, SECTION);
    let config = RelativeSensorConfig::read(&mut reader, reference_sat_id_input)?;
    Ok(reader.finish(config))
}

/// Scalar range between two spacecraft.
pub struct RelativeDistanceSensor<'a> {
    config: RelativeSensorConfig,
    sensor_base: SensorBase<1>,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    measured_distance_m: f64,
    result_id: Option<ResultId>,
}

impl<'a> RelativeDistanceSensor<'a> {
    pub fn new(
        config: RelativeSensorConfig,
        sensor_base: SensorBase<1>,
        relative_information: &'a dyn RelativeInformation,
        dynamics: &'a dyn Dynamics,
    ) -> Self {
        Self {
            config,
            sensor_base,
            relative_information,
            dynamics,
            measured_distance_m: 0.0,
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
        let config = load_config(source, reference_sat_id_input)?.emit();
        let sensor_base =
            read_sensor_information(source, step_time_s * config.prescaler as f64, SECTION, "m")?;
        clock.register(SECTION, config.prescaler);
        Ok(Self::new(config, sensor_base, relative_information, dynamics))
    }

    pub fn config(&self) -> &RelativeSensorConfig {
        &self.config
    }

    pub fn target_sat_id(&self) -> i64 {
        self.config.target_sat_id
    }

    pub fn reference_sat_id(&self) -> i64 {
        self.config.reference_sat_id
    }

    pub fn dynamics(&self) -> &'a dyn Dynamics {
        self.dynamics
    }

    pub fn measured_distance_m(&self) -> f64 {
        self.measured_distance_m
    }
}

impl Component for RelativeDistanceSensor<'_> {
    fn prescaler(&self) -> u64 {
        self.config.prescaler
    }

    fn main_routine(&mut self, _count: u64) {
        let distance = self
            .relative_information
            .relative_distance_m(self.config.target_sat_id, self.config.reference_sat_id);
        self.measured_distance_m = self.sensor_base.measure(&Vector1::new(distance))[0];
    }
}

impl FfResult for RelativeDistanceSensor<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        self.result_id = Some(results.new_entry("relative_distance_sensor", &["measured_distance(m)"])?);
        Ok(())
    }

    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        match self.result_id {
            Some(id) => results.write_record(id, &[self.measured_distance_m.to_string()]),
            None => Ok(()),
        }
    }
}

pub fn initialize_relative_distance_sensor<'a>(
    clock: &mut ClockGenerator,
    file_name: impl AsRef<Path>,
    step_time_s: f64,
    relative_information: &'a dyn RelativeInformation,
    dynamics: &'a dyn Dynamics,
    reference_sat_id_input: i64,
) -> Result<RelativeDistanceSensor<'a>, SensorErrors> {
    let file = ConfigFile::open(file_name)?;
    RelativeDistanceSensor::from_config(
        clock,
        &file,
        step_time_s,
        relative_information,
        dynamics,
        reference_sat_id_input,
    )
}
