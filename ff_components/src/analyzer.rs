use std::io::Write;

use ff_result::{FfResult, ResultErrors, ResultId, ResultManager};
use nalgebra::Vector3;

use crate::{
    clock::ClockGenerator,
    environment::RelativeInformation,
    sensor::{
        relative_distance::RelativeDistanceSensor, relative_position::RelativePositionSensor,
        relative_velocity::RelativeVelocitySensor,
    },
};

/// Compares the relative sensors against the true relative state.
pub struct RelativeOrbitAnalyzer<'a> {
    relative_information: &'a dyn RelativeInformation,
    target_sat_id: i64,
    reference_sat_id: i64,
    true_position_rtn_m: Vector3<f64>,
    true_velocity_rtn_m_s: Vector3<f64>,
    true_distance_m: f64,
    distance_error_m: f64,
    position_error_rtn_m: Vector3<f64>,
    velocity_error_rtn_m_s: Vector3<f64>,
    result_id: Option<ResultId>,
}

impl<'a> RelativeOrbitAnalyzer<'a> {
    pub const NAME: &'static str = "RELATIVE_ORBIT_ANALYZER";

    /// Truth is reported for the velocity sensor's target/reference pair.
    pub fn new(
        clock: &mut ClockGenerator,
        relative_information: &'a dyn RelativeInformation,
        velocity_sensor: &RelativeVelocitySensor<'_>,
    ) -> Self {
        clock.register(Self::NAME, 1);
        Self {
            relative_information,
            target_sat_id: velocity_sensor.target_sat_id(),
            reference_sat_id: velocity_sensor.reference_sat_id(),
            true_position_rtn_m: Vector3::zeros(),
            true_velocity_rtn_m_s: Vector3::zeros(),
            true_distance_m: 0.0,
            distance_error_m: 0.0,
            position_error_rtn_m: Vector3::zeros(),
            velocity_error_rtn_m_s: Vector3::zeros(),
            result_id: None,
        }
    }

    pub fn true_position_rtn_m(&self) -> &Vector3<f64> {
        &self.true_position_rtn_m
    }

    pub fn true_velocity_rtn_m_s(&self) -> &Vector3<f64> {
        &self.true_velocity_rtn_m_s
    }

    pub fn true_distance_m(&self) -> f64 {
        self.true_distance_m
    }

    pub fn distance_error_m(&self) -> f64 {
        self.distance_error_m
    }

    pub fn position_error_rtn_m(&self) -> &Vector3<f64> {
        &self.position_error_rtn_m
    }

    pub fn velocity_error_rtn_m_s(&self) -> &Vector3<f64> {
        &self.velocity_error_rtn_m_s
    }

    /// Runs every tick. Each sensor is compared against the truth for its
    /// own pair.
    pub fn update(
        &mut self,
        distance_sensor: &RelativeDistanceSensor<'_>,
        position_sensor: &RelativePositionSensor<'_>,
        velocity_sensor: &RelativeVelocitySensor<'_>,
    ) {
        let rel = self.relative_information;
        let (target, reference) = (self.target_sat_id, self.reference_sat_id);
        self.true_position_rtn_m = rel.relative_position_rtn_m(target, reference);
        self.true_velocity_rtn_m_s = rel.relative_velocity_rtn_m_s(target, reference);
        self.true_distance_m = rel.relative_distance_m(target, reference);

        let true_distance = rel.relative_distance_m(
            distance_sensor.target_sat_id(),
            distance_sensor.reference_sat_id(),
        );
        self.distance_error_m = distance_sensor.measured_distance_m() - true_distance;

        let true_position = rel.relative_position_rtn_m(
            position_sensor.target_sat_id(),
            position_sensor.reference_sat_id(),
        );
        self.position_error_rtn_m = position_sensor.measured_position_rtn_m() - true_position;

        let true_velocity = rel.relative_velocity_rtn_m_s(
            velocity_sensor.target_sat_id(),
            velocity_sensor.reference_sat_id(),
        );
        self.velocity_error_rtn_m_s = velocity_sensor.measured_velocity_rtn_m_s() - true_velocity;
    }
}

impl FfResult for RelativeOrbitAnalyzer<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let id = results.new_entry(
            "relative_orbit_analyzer",
            &[
                "true_position_rtn[x](m)",
                "true_position_rtn[y](m)",
                "true_position_rtn[z](m)",
                "true_velocity_rtn[x](m/s)",
                "true_velocity_rtn[y](m/s)",
                "true_velocity_rtn[z](m/s)",
                "true_distance(m)",
                "distance_error(m)",
                "position_error_rtn[x](m)",
                "position_error_rtn[y](m)",
                "position_error_rtn[z](m)",
                "velocity_error_rtn[x](m/s)",
                "velocity_error_rtn[y](m/s)",
                "velocity_error_rtn[z](m/s)",
            ],
        )?;
        self.result_id = Some(id);
        Ok(())
    }

    fn write_result<W: Write>(&self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let Some(id) = self.result_id else {
            return Ok(());
        };
        let mut content: Vec<String> = Vec::with_capacity(14);
        content.extend(self.true_position_rtn_m.iter().map(|x| x.to_string()));
        content.extend(self.true_velocity_rtn_m_s.iter().map(|x| x.to_string()));
        content.push(self.true_distance_m.to_string());
        content.push(self.distance_error_m.to_string());
        content.extend(self.position_error_rtn_m.iter().map(|x| x.to_string()));
        content.extend(self.velocity_error_rtn_m_s.iter().map(|x| x.to_string()));
        results.write_record(id, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::Component,
        sensor::{
            RelativeSensorConfig, SensorBase,
            relative_position::{RelativePositionErrorFrame, RelativePositionSensorConfig},
            relative_velocity::{RelativeVelocityErrorFrame, RelativeVelocitySensorConfig},
        },
        testing::{FixedDynamics, FixedRelativeInformation},
    };
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector1;

    #[test]
    fn test_reports_truth_and_errors() {
        let rel = FixedRelativeInformation {
            position_inertial: Vector3::new(0.0, 0.0, 20.0),
            position_rtn: Vector3::new(0.0, 20.0, 0.0),
            velocity_rtn: Vector3::new(0.1, 0.0, 0.0),
            ..Default::default()
        };
        let dynamics = FixedDynamics::default();
        let sensor = RelativeSensorConfig {
            prescaler: 1,
            target_sat_id: 0,
            reference_sat_id: 1,
        };
        let mut distance = RelativeDistanceSensor::new(
            sensor,
            SensorBase::ideal().with_constant_bias(Vector1::new(-0.5)),
            &rel,
            &dynamics,
        );
        let mut position = RelativePositionSensor::new(
            RelativePositionSensorConfig {
                sensor,
                error_frame: RelativePositionErrorFrame::Rtn,
            },
            SensorBase::ideal().with_constant_bias(Vector3::new(1.0, 2.0, 3.0)),
            &rel,
            &dynamics,
        );
        let mut velocity = RelativeVelocitySensor::new(
            RelativeVelocitySensorConfig {
                sensor,
                error_frame: RelativeVelocityErrorFrame::Rtn,
            },
            SensorBase::ideal(),
            &rel,
            &dynamics,
        );
        let mut clock = ClockGenerator::new();
        let mut analyzer = RelativeOrbitAnalyzer::new(&mut clock, &rel, &velocity);

        distance.tick(0);
        position.tick(0);
        velocity.tick(0);
        analyzer.update(&distance, &position, &velocity);

        assert_abs_diff_eq!(*analyzer.true_position_rtn_m(), Vector3::new(0.0, 20.0, 0.0));
        assert_abs_diff_eq!(*analyzer.true_velocity_rtn_m_s(), Vector3::new(0.1, 0.0, 0.0));
        assert_abs_diff_eq!(analyzer.true_distance_m(), 20.0);
        assert_abs_diff_eq!(analyzer.distance_error_m(), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(*analyzer.position_error_rtn_m(), Vector3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
        assert_abs_diff_eq!(*analyzer.velocity_error_rtn_m_s(), Vector3::zeros());
    }
}
