use crate::error::InputError;

/// Configuration for pattern analysis and prediction with tunable thresholds.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    /// History cap; the oldest record is evicted first
    pub max_history: usize,

    /// Activities with fewer recorded sessions produce no predictions
    pub min_samples: usize,

    /// Shorter activities are discarded instead of recorded
    pub min_duration_secs: f64,

    /// Predictions below this confidence are dropped; day and hour each
    /// need at least half of it
    pub confidence_threshold: f64,

    /// Days to look ahead, starting with today
    pub horizon_days: u32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            min_samples: 5,
            min_duration_secs: 30.0,
            confidence_threshold: 0.6,
            horizon_days: 7,
        }
    }
}

impl PredictionConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, InputError> {
        self.set_threshold(threshold)?;
        Ok(self)
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), InputError> {
        self.confidence_threshold = validate_threshold(threshold)?;
        Ok(())
    }
}

pub fn validate_threshold(threshold: f64) -> Result<f64, InputError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(InputError::InvalidThreshold(threshold));
    }
    Ok(threshold)
}

/// Map the 1-10 sensitivity setting onto a confidence threshold.
/// Higher sensitivity means a lower bar: 5 gives 0.6, 10 gives 0.1.
pub fn threshold_from_sensitivity(sensitivity: u8) -> Result<f64, InputError> {
    if !(1..=10).contains(&sensitivity) {
        return Err(InputError::InvalidSensitivity(sensitivity));
    }
    Ok((1.1 - f64::from(sensitivity) / 10.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_maps_to_threshold() {
        assert!((threshold_from_sensitivity(5).unwrap() - 0.6).abs() < 1e-9);
        assert!((threshold_from_sensitivity(10).unwrap() - 0.1).abs() < 1e-9);
        assert!(threshold_from_sensitivity(1).unwrap() <= 1.0);
        assert_eq!(
            threshold_from_sensitivity(0),
            Err(InputError::InvalidSensitivity(0))
        );
        assert_eq!(
            threshold_from_sensitivity(11),
            Err(InputError::InvalidSensitivity(11))
        );
    }

    #[test]
    fn rejects_thresholds_outside_unit_range() {
        assert!(PredictionConfig::default().with_threshold(0.5).is_ok());
        assert!(PredictionConfig::default().with_threshold(1.5).is_err());
        assert!(PredictionConfig::default().with_threshold(-0.1).is_err());
        assert!(PredictionConfig::default().with_threshold(f64::NAN).is_err());
    }
}
