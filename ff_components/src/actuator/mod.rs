use ff_config::ConfigErrors;
use nalgebra::Vector3;
use thiserror::Error;

pub mod force_generator;

#[derive(Debug, Error)]
pub enum ActuatorErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("[{section}] {key} must not be negative")]
    NegativeStandardDeviation { section: String, key: String },
}

/// Anything that pushes on the spacecraft body.
pub trait Actuator {
    fn force_body_n(&self) -> Vector3<f64>;
    fn torque_body_nm(&self) -> Vector3<f64>;
}

/// Sum of the body frame forces of `actuators`.
pub fn total_force_body_n(actuators: &[&dyn Actuator]) -> Vector3<f64> {
    actuators
        .iter()
        .fold(Vector3::zeros(), |sum, actuator| sum + actuator.force_body_n())
}

/// Sum of the body frame torques of `actuators`.
pub fn total_torque_body_nm(actuators: &[&dyn Actuator]) -> Vector3<f64> {
    actuators
        .iter()
        .fold(Vector3::zeros(), |sum, actuator| sum + actuator.torque_body_nm())
}
