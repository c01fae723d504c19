use std::{io::Write, path::Path};

use ff_config::{ConfigErrors, ConfigFile, ConfigurationSource, Loaded, SectionReader};
use ff_result::{FfResult, ResultErrors, ResultId, ResultManager};
use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3};
use serde::Serialize;

use super::{Actuator, ActuatorErrors};
use crate::{
    clock::{ClockGenerator, Component},
    environment::{Dynamics, dcm_inertial_to_rtn},
    sensor::noise::Noise,
};

pub const SECTION: &str = "FORCE_GENERATOR";

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ForceGeneratorConfig {
    pub prescaler: u64,
    pub magnitude_standard_deviation_n: f64,
    pub direction_standard_deviation_rad: f64,
    pub random_seed: Option<u64>,
}

impl ForceGeneratorConfig {
    pub fn load(source: &dyn ConfigurationSource) -> Result<Loaded<Self>, ConfigErrors> {
        let mut reader = SectionReader::new(source, SECTION);
        let prescaler = reader.prescaler()?;
        let magnitude_standard_deviation_n =
            reader.read_double_or("force_magnitude_standard_deviation_N", 0.0)?;
        let direction_standard_deviation_deg =
            reader.read_double_or("force_direction_standard_deviation_deg", 0.0)?;
        let random_seed = if reader.contains("random_seed") {
            Some(reader.read_int("random_seed")? as u64)
        } else {
            None
        };
        Ok(reader.finish(Self {
            prescaler,
            magnitude_standard_deviation_n,
            direction_standard_deviation_rad: direction_standard_deviation_deg.to_radians(),
            random_seed,
        }))
    }

    fn validate(self) -> Result<Self, ActuatorErrors> {
        let negative = |key: &str| ActuatorErrors::NegativeStandardDeviation {
            section: SECTION.to_string(),
            key: key.to_string(),
        };
        if self.magnitude_standard_deviation_n < 0.0 {
            return Err(negative("force_magnitude_standard_deviation_N"));
        }
        if self.direction_standard_deviation_rad < 0.0 {
            return Err(negative("force_direction_standard_deviation_deg"));
        }
        Ok(self)
    }
}

/// Ideal thruster set producing whatever force it is ordered, up to a
/// magnitude and direction error. It never produces torque.
pub struct ForceGenerator<'a> {
    config: ForceGeneratorConfig,
    noise: Noise,
    dynamics: &'a dyn Dynamics,
    ordered_force_body_n: Vector3<f64>,
    generated_force_body_n: Vector3<f64>,
    generated_force_inertial_n: Vector3<f64>,
    generated_force_rtn_n: Vector3<f64>,
    result_id: Option<ResultId>,
}

impl<'a> ForceGenerator<'a> {
    pub fn new(config: ForceGeneratorConfig, dynamics: &'a dyn Dynamics) -> Self {
        let noise = match config.random_seed {
            Some(seed) => Noise::from_seed(seed),
            None => Noise::new(),
        };
        Self {
            config,
            noise,
            dynamics,
            ordered_force_body_n: Vector3::zeros(),
            generated_force_body_n: Vector3::zeros(),
            generated_force_inertial_n: Vector3::zeros(),
            generated_force_rtn_n: Vector3::zeros(),
            result_id: None,
        }
    }

    pub fn from_config(
        clock: &mut ClockGenerator,
        source: &dyn ConfigurationSource,
        dynamics: &'a dyn Dynamics,
    ) -> Result<Self, ActuatorErrors> {
        let config = ForceGeneratorConfig::load(source)?.emit().validate()?;
        clock.register(SECTION, config.prescaler);
        Ok(Self::new(config, dynamics))
    }

    pub fn config(&self) -> &ForceGeneratorConfig {
        &self.config
    }

    pub fn ordered_force_body_n(&self) -> &Vector3<f64> {
        &self.ordered_force_body_n
    }

    pub fn generated_force_body_n(&self) -> &Vector3<f64> {
        &self.generated_force_body_n
    }

    pub fn generated_force_inertial_n(&self) -> &Vector3<f64> {
        &self.generated_force_inertial_n
    }

    pub fn generated_force_rtn_n(&self) -> &Vector3<f64> {
        &self.generated_force_rtn_n
    }

    pub fn set_force_body_n(&mut self, force: Vector3<f64>) {
        self.ordered_force_body_n = force;
    }

    pub fn set_force_inertial_n(&mut self, force: Vector3<f64>) {
        let attitude = self.dynamics.quaternion_inertial_to_body();
        self.ordered_force_body_n = attitude.transform_vector(&force);
    }

    /// Orders a force given in the RTN frame of this spacecraft's own orbit.
    pub fn set_force_rtn_n(&mut self, force: Vector3<f64>) {
        self.set_force_inertial_n(self.dcm_inertial_to_rtn().transpose() * force);
    }

    fn dcm_inertial_to_rtn(&self) -> Matrix3<f64> {
        dcm_inertial_to_rtn(
            &self.dynamics.position_inertial_m(),
            &self.dynamics.velocity_inertial_m_s(),
        )
    }

    fn apply_errors(&mut self, ordered: Vector3<f64>) -> Vector3<f64> {
        let magnitude = ordered.norm();
        let Some(direction) = Unit::try_new(ordered, f64::EPSILON) else {
            return Vector3::zeros();
        };

        let magnitude =
            magnitude + self.config.magnitude_standard_deviation_n * self.noise.standard_normal();

        let sigma = self.config.direction_standard_deviation_rad;
        let direction = if sigma > 0.0 {
            // rotate about a random axis normal to the ordered direction
            let random = self.noise.normal(&Vector3::repeat(1.0));
            match Unit::try_new(direction.cross(&random), f64::EPSILON) {
                Some(axis) => {
                    let angle = sigma * self.noise.standard_normal();
                    UnitQuaternion::from_axis_angle(&axis, angle) * direction
                }
                None => direction,
            }
        } else {
            direction
        };
        direction.into_inner() * magnitude
    }
}

impl Component for ForceGenerator<'_> {
    fn prescaler(&self) -> u64 {
        self.config.prescaler
    }

    fn main_routine(&mut self, _count: u64) {
        let generated = self.apply_errors(self.ordered_force_body_n);
        let inertial = self
            .dynamics
            .quaternion_inertial_to_body()
            .inverse_transform_vector(&generated);
        self.generated_force_body_n = generated;
        self.generated_force_inertial_n = inertial;
        self.generated_force_rtn_n = self.dcm_inertial_to_rtn() * inertial;
    }
}

impl Actuator for ForceGenerator<'_> {
    fn force_body_n(&self) -> Vector3<f64> {
        self.generated_force_body_n
    }

    fn torque_body_nm(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
}

impl FfResult for ForceGenerator<'_> {
    fn new_result<W: Write>(&mut self, results: &mut ResultManager<W>) -> Result<(), ResultErrors> {
        let id = results.new_entry(
            "force_generator",
            &[
                "ordered_force_b[x](N)",
                "ordered_force_b[y](N)",
                "ordered_force_b[z](N)",
                "generated_force_b[x](N)",
                "generated_force_b[y](N)",
                "generated_force_b[z](N)",
                "generated_force_i[x](N)",
                "generated_force_i[y](N)",
                "generated_force_i[z](N)",
                "generated_force_rtn[x](N)",
                "generated_force_rtn[y](N)",
                "generated_force_rtn[z](N)",
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
            &self.ordered_force_body_n,
            &self.generated_force_body_n,
            &self.generated_force_inertial_n,
            &self.generated_force_rtn_n,
        ]
        .into_iter()
        .flat_map(|v| v.iter().map(|x| x.to_string()))
        .collect();
        results.write_record(id, &content)
    }
}

pub fn initialize_force_generator<'a>(
    clock: &mut ClockGenerator,
    file_name: impl AsRef<Path>,
    dynamics: &'a dyn Dynamics,
) -> Result<ForceGenerator<'a>, ActuatorErrors> {
    let file = ConfigFile::open(file_name)?;
    ForceGenerator::from_config(clock, &file, dynamics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedDynamics;
    use approx::assert_abs_diff_eq;

    fn ideal(prescaler: u64) -> ForceGeneratorConfig {
        ForceGeneratorConfig {
            prescaler,
            magnitude_standard_deviation_n: 0.0,
            direction_standard_deviation_rad: 0.0,
            random_seed: Some(1),
        }
    }

    #[test]
    fn test_ideal_body_command() {
        let dynamics = FixedDynamics::default();
        let mut generator = ForceGenerator::new(ideal(2), &dynamics);
        generator.set_force_body_n(Vector3::new(0.1, 0.0, -0.2));
        generator.tick(1);
        assert_eq!(generator.force_body_n(), Vector3::zeros());
        generator.tick(2);
        assert_abs_diff_eq!(generator.force_body_n(), Vector3::new(0.1, 0.0, -0.2), epsilon = 1e-15);
        assert_eq!(generator.torque_body_nm(), Vector3::zeros());
    }

    #[test]
    fn test_inertial_command_rotates_into_body() {
        let dynamics = FixedDynamics {
            attitude: UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            ..Default::default()
        };
        let mut generator = ForceGenerator::new(ideal(1), &dynamics);
        generator.set_force_inertial_n(Vector3::new(1.0, 0.0, 0.0));
        generator.tick(0);
        assert_abs_diff_eq!(generator.force_body_n(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(
            *generator.generated_force_inertial_n(),
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rtn_command_uses_own_orbit() {
        // radial is inertial y, along-track is inertial -x
        let dynamics = FixedDynamics {
            position: Vector3::new(0.0, 7.0e6, 0.0),
            velocity: Vector3::new(-7.5e3, 0.0, 0.0),
            ..Default::default()
        };
        let mut generator = ForceGenerator::new(ideal(1), &dynamics);
        generator.set_force_rtn_n(Vector3::new(0.0, 2.0, 0.0));
        generator.tick(0);
        assert_abs_diff_eq!(generator.force_body_n(), Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(
            *generator.generated_force_rtn_n(),
            Vector3::new(0.0, 2.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_magnitude_error_keeps_direction() {
        let dynamics = FixedDynamics::default();
        let config = ForceGeneratorConfig {
            magnitude_standard_deviation_n: 0.05,
            ..ideal(1)
        };
        let mut generator = ForceGenerator::new(config, &dynamics);
        generator.set_force_body_n(Vector3::new(0.0, 0.0, 1.0));
        generator.tick(0);
        let force = generator.force_body_n();
        assert_abs_diff_eq!(force.x, 0.0);
        assert_abs_diff_eq!(force.y, 0.0);
        assert!(force.z != 1.0);
    }

    #[test]
    fn test_direction_error_keeps_magnitude() {
        let dynamics = FixedDynamics::default();
        let config = ForceGeneratorConfig {
            direction_standard_deviation_rad: 1.0_f64.to_radians(),
            ..ideal(1)
        };
        let mut generator = ForceGenerator::new(config, &dynamics);
        let ordered = Vector3::new(3.0, 4.0, 0.0);
        generator.set_force_body_n(ordered);
        generator.tick(0);
        let force = generator.force_body_n();
        assert_abs_diff_eq!(force.norm(), 5.0, epsilon = 1e-12);
        assert!(force.angle(&ordered) > 0.0);
    }

    #[test]
    fn test_zero_command_has_no_error() {
        let dynamics = FixedDynamics::default();
        let config = ForceGeneratorConfig {
            magnitude_standard_deviation_n: 1.0,
            direction_standard_deviation_rad: 1.0,
            ..ideal(1)
        };
        let mut generator = ForceGenerator::new(config, &dynamics);
        generator.tick(0);
        assert_eq!(generator.force_body_n(), Vector3::zeros());
    }

    #[test]
    fn test_load_defaults_and_validation() {
        let file: ConfigFile = "[FORCE_GENERATOR]\nprescaler = -3".parse().unwrap();
        let loaded = ForceGeneratorConfig::load(&file).unwrap();
        assert!(loaded.diagnostics.is_empty());
        assert_eq!(loaded.value, ForceGeneratorConfig {
            prescaler: 1,
            magnitude_standard_deviation_n: 0.0,
            direction_standard_deviation_rad: 0.0,
            random_seed: None,
        });

        let file: ConfigFile =
            "[FORCE_GENERATOR]\nprescaler = 1\nforce_direction_standard_deviation_deg = -1.0"
                .parse()
                .unwrap();
        let dynamics = FixedDynamics::default();
        let mut clock = ClockGenerator::new();
        assert!(matches!(
            ForceGenerator::from_config(&mut clock, &file, &dynamics),
            Err(ActuatorErrors::NegativeStandardDeviation { .. })
        ));
        assert!(clock.registrations().is_empty());
    }
}
