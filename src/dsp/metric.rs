use crate::dsp::config::MetricConfig;
use crate::types::{Band, BandPowerVector};
/// Ratio of two smoothed band powers.
///
/// Division follows IEEE rules: a zero denominator gives `+inf` (or `-inf`), and
/// `0 / 0` gives `NaN`. The caller decides how to treat non-finite values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricEstimator {
    numerator: Band,
    denominator: Band,
}
impl MetricEstimator {
    pub fn new(numerator: Band, denominator: Band) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
    /// Concentration: rises with beta activity relative to theta.
    pub fn beta_theta() -> Self {
        Self::new(Band::Beta, Band::Theta)
    }
    /// Inattention marker used in ADHD protocols.
    pub fn theta_beta() -> Self {
        Self::new(Band::Theta, Band::Beta)
    }
    /// Relaxation.
    pub fn alpha_theta() -> Self {
        Self::new(Band::Alpha, Band::Theta)
    }
    pub fn numerator(&self) -> Band {
        self.numerator
    }
    pub fn denominator(&self) -> Band {
        self.denominator
    }
    pub fn compute(&self, smoothed: &BandPowerVector) -> f64 {
        smoothed[self.numerator] / smoothed[self.denominator]
    }
}
impl Default for MetricEstimator {
    fn default() -> Self {
        Self::beta_theta()
    }
}
impl From<MetricConfig> for MetricEstimator {
    fn from(config: MetricConfig) -> Self {
        Self::new(config.numerator, config.denominator)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn beta_over_theta() {
        let smoothed = BandPowerVector::new(1.0, 2.0, 1.5, 6.0);
        assert_eq!(MetricEstimator::default().compute(&smoothed), 3.0);
    }
    #[test]
    fn zero_theta_gives_positive_infinity() {
        let smoothed = BandPowerVector::new(1.0, 0.0, 1.0, 4.0);
        let metric = MetricEstimator::beta_theta().compute(&smoothed);
        assert!(metric.is_infinite() && metric.is_sign_positive());
    }
    #[test]
    fn all_zero_gives_nan() {
        let metric = MetricEstimator::beta_theta().compute(&BandPowerVector::zeros());
        assert!(metric.is_nan());
    }
    #[test]
    fn other_ratios() {
        let smoothed = BandPowerVector::new(1.0, 2.0, 1.5, 6.0);
        assert_eq!(MetricEstimator::theta_beta().compute(&smoothed), 2.0 / 6.0);
        assert_eq!(MetricEstimator::alpha_theta().compute(&smoothed), 0.75);
        let from_config = MetricEstimator::from(MetricConfig {
            numerator: Band::Delta,
            denominator: Band::Alpha,
        });
        assert_eq!(from_config.compute(&smoothed), 1.0 / 1.5);
    }
}
