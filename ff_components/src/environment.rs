//! Interfaces to simulation state owned outside the component set.
//!
//! Components only read through these. Owners that advance the state between
//! ticks do so through interior mutability on their side.

use std::path::PathBuf;

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

pub trait Dynamics {
    fn position_inertial_m(&self) -> Vector3<f64>;
    fn velocity_inertial_m_s(&self) -> Vector3<f64>;
    /// Rotation taking inertial vectors into the body frame
    fn quaternion_inertial_to_body(&self) -> UnitQuaternion<f64>;
}

pub trait Structure {
    fn mass_kg(&self) -> f64;
}

/// Environment around this spacecraft. None of the installed instruments
/// sample it yet.
pub trait LocalEnvironment {}

pub trait GlobalEnvironment {
    /// Base period of the component clock
    fn component_step_time_s(&self) -> f64;
    fn elapsed_time_s(&self) -> f64;
}

pub trait SimulationConfiguration {
    /// Path of the file describing spacecraft `sat_id`, if configured
    fn spacecraft_file(&self, sat_id: usize) -> Option<PathBuf>;
}

/// Relative states between spacecraft of the formation.
///
/// Quantities are of `target` with respect to `reference`; RTN quantities
/// are expressed in the RTN frame of `reference`.
pub trait RelativeInformation {
    fn relative_position_inertial_m(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64>;
    fn relative_velocity_inertial_m_s(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64>;
    fn relative_position_rtn_m(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64>;
    fn relative_velocity_rtn_m_s(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64>;
    fn dcm_inertial_to_rtn(&self, reference_sat_id: i64) -> Matrix3<f64>;

    fn relative_distance_m(&self, target_sat_id: i64, reference_sat_id: i64) -> f64 {
        self.relative_position_inertial_m(target_sat_id, reference_sat_id)
            .norm()
    }
}

/// Direction cosine matrix from inertial to the RTN frame of an orbit.
/// Rows are the radial, along-track and orbit normal unit vectors.
pub fn dcm_inertial_to_rtn(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Matrix3<f64> {
    let r = position.normalize();
    let n = position.cross(velocity).normalize();
    let t = n.cross(&r);
    Matrix3::from_rows(&[r.transpose(), t.transpose(), n.transpose()])
}
