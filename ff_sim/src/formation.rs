//! Two spacecraft around a point-mass Earth: a chief on an unperturbed
//! circular orbit and a deputy propagated with its own thrust.

use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
};

use ff_components::environment::{
    Dynamics, GlobalEnvironment, LocalEnvironment, RelativeInformation, SimulationConfiguration,
    Structure, dcm_inertial_to_rtn,
};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::scenario::{OrbitScenario, Scenario};

pub const EARTH_MU_M3_S2: f64 = 3.986004418e14;
pub const EARTH_RADIUS_M: f64 = 6.378137e6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitState {
    pub position_m: Vector3<f64>,
    pub velocity_m_s: Vector3<f64>,
}

impl OrbitState {
    pub fn circular(orbit: &OrbitScenario, time_s: f64) -> Self {
        let radius = EARTH_RADIUS_M + orbit.altitude_m;
        let mean_motion = (EARTH_MU_M3_S2 / radius.powi(3)).sqrt();
        let angle = orbit.phase_deg.to_radians() + mean_motion * time_s;
        let (sin, cos) = angle.sin_cos();
        Self {
            position_m: Vector3::new(cos, sin, 0.0) * radius,
            velocity_m_s: Vector3::new(-sin, cos, 0.0) * radius * mean_motion,
        }
    }

    fn gravity(position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        -position * (EARTH_MU_M3_S2 / r.powi(3))
    }

    /// Velocity Verlet step under gravity plus a constant acceleration.
    pub fn step(&mut self, acceleration_m_s2: &Vector3<f64>, dt_s: f64) {
        let a0 = Self::gravity(&self.position_m) + acceleration_m_s2;
        self.position_m += self.velocity_m_s * dt_s + a0 * (0.5 * dt_s * dt_s);
        let a1 = Self::gravity(&self.position_m) + acceleration_m_s2;
        self.velocity_m_s += (a0 + a1) * (0.5 * dt_s);
    }
}

/// The simulated world the deputy's components look at. Stepping goes
/// through interior mutability since the components hold shared borrows.
pub struct Formation {
    chief_sat_id: usize,
    chief_orbit: OrbitScenario,
    deputy_sat_id: usize,
    deputy_file: PathBuf,
    deputy_mass_kg: f64,
    deputy: RefCell<OrbitState>,
    step_time_s: f64,
    elapsed_time_s: Cell<f64>,
}

impl Formation {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            chief_sat_id: scenario.chief.sat_id,
            chief_orbit: scenario.chief.orbit,
            deputy_sat_id: scenario.deputy.sat_id,
            deputy_file: scenario.deputy.file.clone(),
            deputy_mass_kg: scenario.deputy.mass_kg,
            deputy: RefCell::new(OrbitState::circular(&scenario.deputy.orbit, 0.0)),
            step_time_s: scenario.step_time_s,
            elapsed_time_s: Cell::new(0.0),
        }
    }

    pub fn deputy_sat_id(&self) -> usize {
        self.deputy_sat_id
    }

    pub fn chief(&self) -> OrbitState {
        OrbitState::circular(&self.chief_orbit, self.elapsed_time_s.get())
    }

    pub fn deputy(&self) -> OrbitState {
        *self.deputy.borrow()
    }

    /// State of `sat_id`; unknown ids sit at the origin.
    fn state(&self, sat_id: i64) -> OrbitState {
        match usize::try_from(sat_id) {
            Ok(id) if id == self.chief_sat_id => self.chief(),
            Ok(id) if id == self.deputy_sat_id => self.deputy(),
            _ => OrbitState {
                position_m: Vector3::zeros(),
                velocity_m_s: Vector3::zeros(),
            },
        }
    }

    /// Advances one component step with the deputy's body-frame force.
    pub fn step(&self, force_body_n: &Vector3<f64>) {
        let force_inertial = self.quaternion_inertial_to_body().inverse_transform_vector(force_body_n);
        let acceleration = force_inertial / self.deputy_mass_kg;
        self.deputy.borrow_mut().step(&acceleration, self.step_time_s);
        self.elapsed_time_s.set(self.elapsed_time_s.get() + self.step_time_s);
    }
}

impl Dynamics for Formation {
    fn position_inertial_m(&self) -> Vector3<f64> {
        self.deputy.borrow().position_m
    }

    fn velocity_inertial_m_s(&self) -> Vector3<f64> {
        self.deputy.borrow().velocity_m_s
    }

    /// Body axes stay aligned with inertial.
    fn quaternion_inertial_to_body(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::identity()
    }
}

impl Structure for Formation {
    fn mass_kg(&self) -> f64 {
        self.deputy_mass_kg
    }
}

impl LocalEnvironment for Formation {}

impl GlobalEnvironment for Formation {
    fn component_step_time_s(&self) -> f64 {
        self.step_time_s
    }

    fn elapsed_time_s(&self) -> f64 {
        self.elapsed_time_s.get()
    }
}

impl SimulationConfiguration for Formation {
    fn spacecraft_file(&self, sat_id: usize) -> Option<PathBuf> {
        (sat_id == self.deputy_sat_id).then(|| self.deputy_file.clone())
    }
}

impl RelativeInformation for Formation {
    fn relative_position_inertial_m(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64> {
        self.state(target_sat_id).position_m - self.state(reference_sat_id).position_m
    }

    fn relative_velocity_inertial_m_s(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64> {
        self.state(target_sat_id).velocity_m_s - self.state(reference_sat_id).velocity_m_s
    }

    fn relative_position_rtn_m(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64> {
        self.dcm_inertial_to_rtn(reference_sat_id)
            * self.relative_position_inertial_m(target_sat_id, reference_sat_id)
    }

    /// Seen from the rotating RTN frame of the reference.
    fn relative_velocity_rtn_m_s(&self, target_sat_id: i64, reference_sat_id: i64) -> Vector3<f64> {
        let reference = self.state(reference_sat_id);
        let r = reference.position_m.norm();
        if r == 0.0 {
            return Vector3::zeros();
        }
        let orbit_rate = reference.position_m.cross(&reference.velocity_m_s).norm() / (r * r);
        let omega = Vector3::new(0.0, 0.0, orbit_rate);
        let dcm = self.dcm_inertial_to_rtn(reference_sat_id);
        let position = dcm * self.relative_position_inertial_m(target_sat_id, reference_sat_id);
        dcm * self.relative_velocity_inertial_m_s(target_sat_id, reference_sat_id) - omega.cross(&position)
    }

    fn dcm_inertial_to_rtn(&self, reference_sat_id: i64) -> Matrix3<f64> {
        let reference = self.state(reference_sat_id);
        if reference.position_m.norm() == 0.0 {
            return Matrix3::identity();
        }
        dcm_inertial_to_rtn(&reference.position_m, &reference.velocity_m_s)
    }
}
