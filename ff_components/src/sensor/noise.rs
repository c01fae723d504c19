use nalgebra::SVector;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rand_distr::StandardNormal;

/// Seeded gaussian source. The seed is kept so a run can be reproduced.
#[derive(Clone, Debug)]
pub struct Noise {
    rng: SmallRng,
    seed: u64,
}

impl Noise {
    pub fn new() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    /// Zero mean gaussian vector with per-axis standard deviation.
    pub fn normal<const N: usize>(&mut self, standard_deviation: &SVector<f64, N>) -> SVector<f64, N> {
        SVector::from_fn(|i, _| standard_deviation[i] * self.standard_normal())
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::new()
    }
}

/// First order random walk that turns back toward zero beyond its limit.
#[derive(Clone, Debug)]
pub struct RandomWalk<const N: usize> {
    standard_deviation: SVector<f64, N>,
    limit: SVector<f64, N>,
    step_s: f64,
    state: SVector<f64, N>,
}

impl<const N: usize> RandomWalk<N> {
    pub fn new(standard_deviation: SVector<f64, N>, limit: SVector<f64, N>, step_s: f64) -> Self {
        Self {
            standard_deviation,
            limit,
            step_s,
            state: SVector::zeros(),
        }
    }

    pub fn state(&self) -> &SVector<f64, N> {
        &self.state
    }

    pub fn step(&mut self, noise: &mut Noise) -> SVector<f64, N> {
        for i in 0..N {
            let mut rate = self.standard_deviation[i] * noise.standard_normal();
            if self.state[i] > self.limit[i] {
                rate = -rate.abs();
            } else if self.state[i] < -self.limit[i] {
                rate = rate.abs();
            }
            self.state[i] += rate * self.step_s;
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_same_seed_same_samples() {
        let mut a = Noise::from_seed(42);
        let mut b = Noise::from_seed(42);
        let sigma = Vector3::new(1.0, 2.0, 3.0);
        for _ in 0..10 {
            assert_eq!(a.normal(&sigma), b.normal(&sigma));
        }
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_zero_deviation_is_silent() {
        let mut noise = Noise::from_seed(1);
        let mut walk = RandomWalk::new(Vector3::zeros(), Vector3::repeat(1.0), 0.1);
        for _ in 0..10 {
            assert_eq!(noise.normal(&Vector3::zeros()), Vector3::zeros());
            assert_eq!(walk.step(&mut noise), Vector3::zeros());
        }
    }

    #[test]
    fn test_walk_turns_back_past_limit() {
        let mut noise = Noise::from_seed(7);
        let limit = 0.01;
        let step = 1.0;
        let sigma = 0.05;
        let mut walk = RandomWalk::new(Vector3::repeat(sigma), Vector3::repeat(limit), step);
        for _ in 0..1000 {
            let previous = *walk.state();
            let state = walk.step(&mut noise);
            for i in 0..3 {
                if previous[i] > limit {
                    assert!(state[i] <= previous[i]);
                } else if previous[i] < -limit {
                    assert!(state[i] >= previous[i]);
                }
            }
        }
    }
}
