//! Instruments of a formation-flying spacecraft: relative navigation
//! sensors, a force generator, an on-board computer, a relative orbit
//! controller and an analyzer, aggregated by [`FfComponents`].

pub mod actuator;
pub mod analyzer;
pub mod cdh;
pub mod clock;
pub mod components;
pub mod controller;
pub mod environment;
pub mod sensor;

use ff_config::ConfigErrors;
use ff_result::ResultErrors;
use thiserror::Error;

pub use actuator::{
    Actuator, ActuatorErrors,
    force_generator::{ForceGenerator, initialize_force_generator},
};
pub use clock::{ClockGenerator, Component};
pub use components::{ComponentFiles, FfComponents, InstalledComponents, SpacecraftReferences};
pub use controller::{ControllerErrors, RelativeOrbitController, initialize_relative_orbit_controller};
pub use sensor::{
    SensorErrors,
    relative_distance::{RelativeDistanceSensor, initialize_relative_distance_sensor},
    relative_position::{RelativePositionSensor, initialize_relative_position_sensor},
    relative_velocity::{RelativeVelocitySensor, initialize_relative_velocity_sensor},
};

#[derive(Debug, Error)]
pub enum ComponentErrors {
    #[error("{0}")]
    Actuator(#[from] ActuatorErrors),
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("{0}")]
    Controller(#[from] ControllerErrors),
    #[error("{0}")]
    Result(#[from] ResultErrors),
    #[error("{0}")]
    Sensor(#[from] SensorErrors),
    #[error("no spacecraft file configured for spacecraft {0}")]
    SpacecraftFileNotFound(usize),
}

#[cfg(test)]
pub(crate) mod testing {
    use nalgebra::{Matrix3, UnitQuaternion, Vector3};

    use crate::environment::{Dynamics, RelativeInformation, Structure};

    /// Spacecraft frozen on a circular orbit whose RTN frame is inertial.
    pub struct FixedDynamics {
        pub position: Vector3<f64>,
        pub velocity: Vector3<f64>,
        pub attitude: UnitQuaternion<f64>,
    }

    impl Default for FixedDynamics {
        fn default() -> Self {
            Self {
                position: Vector3::new(7.0e6, 0.0, 0.0),
                velocity: Vector3::new(0.0, 7.5e3, 0.0),
                attitude: UnitQuaternion::identity(),
            }
        }
    }

    impl Dynamics for FixedDynamics {
        fn position_inertial_m(&self) -> Vector3<f64> {
            self.position
        }

        fn velocity_inertial_m_s(&self) -> Vector3<f64> {
            self.velocity
        }

        fn quaternion_inertial_to_body(&self) -> UnitQuaternion<f64> {
            self.attitude
        }
    }

    /// Same relative state for every spacecraft pair.
    pub struct FixedRelativeInformation {
        pub position_inertial: Vector3<f64>,
        pub velocity_inertial: Vector3<f64>,
        pub position_rtn: Vector3<f64>,
        pub velocity_rtn: Vector3<f64>,
        pub dcm: Matrix3<f64>,
    }

    impl Default for FixedRelativeInformation {
        fn default() -> Self {
            Self {
                position_inertial: Vector3::zeros(),
                velocity_inertial: Vector3::zeros(),
                position_rtn: Vector3::zeros(),
                velocity_rtn: Vector3::zeros(),
                dcm: Matrix3::identity(),
            }
        }
    }

    impl RelativeInformation for FixedRelativeInformation {
        fn relative_position_inertial_m(&self, _: i64, _: i64) -> Vector3<f64> {
            self.position_inertial
        }

        fn relative_velocity_inertial_m_s(&self, _: i64, _: i64) -> Vector3<f64> {
            self.velocity_inertial
        }

        fn relative_position_rtn_m(&self, _: i64, _: i64) -> Vector3<f64> {
            self.position_rtn
        }

        fn relative_velocity_rtn_m_s(&self, _: i64, _: i64) -> Vector3<f64> {
            self.velocity_rtn
        }

        fn dcm_inertial_to_rtn(&self, _: i64) -> Matrix3<f64> {
            self.dcm
        }
    }

    pub struct FixedStructure(pub f64);

    impl Structure for FixedStructure {
        fn mass_kg(&self) -> f64 {
            self.0
        }
    }
}
