pub mod noise;
pub mod relative_distance;
pub mod relative_position;
pub mod relative_velocity;

use ff_config::{ConfigErrors, ConfigurationSource, SectionReader};
use nalgebra::{SMatrix, SVector};
use noise::{Noise, RandomWalk};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorErrors {
    #[error("{0}")]
    Config(#[from] ConfigErrors),
    #[error("[{section}] range_to_const must not exceed range_to_zero")]
    InvalidRange { section: String },
    #[error("[{section}] {key} must not be negative")]
    NegativeStandardDeviation { section: String, key: String },
}

/// Fields shared by every relative sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RelativeSensorConfig {
    /// Always at least one
    pub prescaler: u64,
    pub target_sat_id: i64,
    pub reference_sat_id: i64,
}

impl RelativeSensorConfig {
    pub fn read(
        reader: &mut SectionReader<'_>,
        reference_sat_id_input: i64,
    ) -> Result<Self, ConfigErrors> {
        let prescaler = reader.prescaler()?;
        let target_sat_id = reader.read_int("target_sat_id")?;
        let reference_sat_id = reader.reference_sat_id(reference_sat_id_input)?;
        Ok(Self {
            prescaler,
            target_sat_id,
            reference_sat_id,
        })
    }
}

/// Measurement error model shared by the sensors: scale factor, constant
/// bias, white noise, random walk and range limits.
#[derive(Clone, Debug)]
pub struct SensorBase<const N: usize> {
    scale_factor: SMatrix<f64, N, N>,
    constant_bias: SVector<f64, N>,
    normal_standard_deviation: SVector<f64, N>,
    random_walk: RandomWalk<N>,
    range_to_const: SVector<f64, N>,
    range_to_zero: SVector<f64, N>,
    noise: Noise,
}

impl<const N: usize> SensorBase<N> {
    /// A sensor that reports the true value.
    pub fn ideal() -> Self {
        Self {
            scale_factor: SMatrix::identity(),
            constant_bias: SVector::zeros(),
            normal_standard_deviation: SVector::zeros(),
            random_walk: RandomWalk::new(SVector::zeros(), SVector::repeat(f64::INFINITY), 0.0),
            range_to_const: SVector::repeat(f64::INFINITY),
            range_to_zero: SVector::repeat(f64::INFINITY),
            noise: Noise::new(),
        }
    }

    pub fn with_constant_bias(mut self, bias: SVector<f64, N>) -> Self {
        self.constant_bias = bias;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: SMatrix<f64, N, N>) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_range(mut self, range_to_const: SVector<f64, N>, range_to_zero: SVector<f64, N>) -> Self {
        self.range_to_const = range_to_const;
        self.range_to_zero = range_to_zero;
        self
    }

    pub fn measure(&mut self, true_value: &SVector<f64, N>) -> SVector<f64, N> {
        let walk = self.random_walk.step(&mut self.noise);
        let white = self.noise.normal(&self.normal_standard_deviation);
        let measured = self.scale_factor * true_value + self.constant_bias + white + walk;
        self.clip(measured)
    }

    /// Saturates at range_to_const and drops to zero beyond range_to_zero.
    fn clip(&self, mut value: SVector<f64, N>) -> SVector<f64, N> {
        for i in 0..N {
            let v = value[i];
            value[i] = if v.abs() >= self.range_to_zero[i] {
                0.0
            } else if v >= self.range_to_const[i] {
                self.range_to_const[i]
            } else if v <= -self.range_to_const[i] {
                -self.range_to_const[i]
            } else {
                v
            };
        }
        value
    }

    pub fn seed(&self) -> u64 {
        self.noise.seed()
    }
}

/// Reads the error model of a sensor from its section. Every key is
/// optional; an empty section yields an ideal sensor. Unit dependent keys
/// carry the `unit` suffix, e.g. `constant_bias_c_m_s`.
pub fn read_sensor_information<const N: usize>(
    source: &dyn ConfigurationSource,
    step_time_s: f64,
    section: &str,
    unit: &str,
) -> Result<SensorBase<N>, SensorErrors> {
    let reader = SectionReader::new(source, section);
    let unbounded = SVector::<f64, N>::repeat(f64::INFINITY);

    let scale_factor = reader.read_matrix_or("scale_factor_c", SMatrix::identity())?;
    let constant_bias = reader.read_vector_or(&format!("constant_bias_c_{unit}"), SVector::zeros())?;

    let key = format!("normal_random_standard_deviation_c_{unit}");
    let normal_standard_deviation = non_negative(section, &key, reader.read_vector_or(&key, SVector::zeros())?)?;

    let key = format!("random_walk_standard_deviation_c_{unit}");
    let walk_standard_deviation = non_negative(section, &key, reader.read_vector_or(&key, SVector::zeros())?)?;
    let walk_limit = reader.read_vector_or(&format!("random_walk_limit_c_{unit}"), unbounded)?;

    let range_to_const = reader.read_vector_or(&format!("range_to_const_c_{unit}"), unbounded)?;
    let range_to_zero = reader.read_vector_or(&format!("range_to_zero_c_{unit}"), unbounded)?;
    if (0..N).any(|i| range_to_const[i] > range_to_zero[i]) {
        return Err(SensorErrors::InvalidRange {
            section: section.to_string(),
        });
    }

    let noise = if reader.contains("random_seed") {
        Noise::from_seed(reader.read_int("random_seed")? as u64)
    } else {
        Noise::new()
    };

    Ok(SensorBase {
        scale_factor,
        constant_bias,
        normal_standard_deviation,
        random_walk: RandomWalk::new(walk_standard_deviation, walk_limit, step_time_s),
        range_to_const,
        range_to_zero,
        noise,
    })
}

fn non_negative<const N: usize>(
    section: &str,
    key: &str,
    value: SVector<f64, N>,
) -> Result<SVector<f64, N>, SensorErrors> {
    if value.iter().any(|v| *v < 0.0) {
        return Err(SensorErrors::NegativeStandardDeviation {
            section: section.to_string(),
            key: key.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ff_config::ConfigFile;
    use nalgebra::{Vector1, Vector3};

    #[test]
    fn test_empty_section_is_ideal() {
        let file: ConfigFile = "[S]\nprescaler = 1".parse().unwrap();
        let mut base = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap();
        let truth = Vector3::new(1.0, -2.0, 3.0);
        assert_eq!(base.measure(&truth), truth);
    }

    #[test]
    fn test_scale_and_bias() {
        let file: ConfigFile = r#"
            [S]
            scale_factor_c = [2, 0, 0, 0, 1, 0, 0, 0, 1]
            constant_bias_c_m_s = [0.5, 0.0, -1.0]
        "#
        .parse()
        .unwrap();
        let mut base = read_sensor_information::<3>(&file, 0.1, "S", "m_s").unwrap();
        let measured = base.measure(&Vector3::new(1.0, 1.0, 1.0));
        assert_abs_diff_eq!(measured, Vector3::new(2.5, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_unit_suffix_selects_keys() {
        let file: ConfigFile = "[S]\nconstant_bias_c_m = 3.0".parse().unwrap();
        let mut base = read_sensor_information::<1>(&file, 0.1, "S", "m_s").unwrap();
        assert_eq!(base.measure(&Vector1::new(1.0)), Vector1::new(1.0));
        let mut base = read_sensor_information::<1>(&file, 0.1, "S", "m").unwrap();
        assert_eq!(base.measure(&Vector1::new(1.0)), Vector1::new(4.0));
    }

    #[test]
    fn test_range_clipping() {
        let mut base = SensorBase::<3>::ideal().with_range(Vector3::repeat(10.0), Vector3::repeat(20.0));
        let measured = base.measure(&Vector3::new(5.0, 15.0, -25.0));
        assert_eq!(measured, Vector3::new(5.0, 10.0, 0.0));
        let measured = base.measure(&Vector3::new(-12.0, 20.0, 9.9));
        assert_eq!(measured, Vector3::new(-10.0, 0.0, 9.9));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let file: ConfigFile = r#"
            [S]
            range_to_const_c_m = [10.0, 10.0, 30.0]
            range_to_zero_c_m = [20.0, 20.0, 20.0]
        "#
        .parse()
        .unwrap();
        let err = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap_err();
        assert!(matches!(err, SensorErrors::InvalidRange { .. }));
    }

    #[test]
    fn test_negative_deviation_rejected() {
        let file: ConfigFile = "[S]\nnormal_random_standard_deviation_c_m = [0.1, -0.1, 0.1]"
            .parse()
            .unwrap();
        let err = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap_err();
        assert!(matches!(err, SensorErrors::NegativeStandardDeviation { .. }));
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let file: ConfigFile = r#"
            [S]
            normal_random_standard_deviation_c_m = [0.1, 0.2, 0.3]
            random_walk_standard_deviation_c_m = [0.01, 0.01, 0.01]
            random_walk_limit_c_m = [0.1, 0.1, 0.1]
            random_seed = 11
        "#
        .parse()
        .unwrap();
        let mut a = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap();
        let mut b = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap();
        assert_eq!(a.seed(), 11);
        let truth = Vector3::new(100.0, 0.0, -100.0);
        let measured = a.measure(&truth);
        assert_ne!(measured, truth);
        assert_eq!(measured, b.measure(&truth));
    }

    #[test]
    fn test_wrong_length_is_fatal() {
        let file: ConfigFile = "[S]\nscale_factor_c = [1, 0, 0, 1]".parse().unwrap();
        let err = read_sensor_information::<3>(&file, 0.1, "S", "m").unwrap_err();
        assert!(matches!(err, SensorErrors::Config(ConfigErrors::LengthMismatch { .. })));
    }
}
