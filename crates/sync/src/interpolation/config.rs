use serde::{Deserialize, Serialize};

use super::history::DEFAULT_CAPACITY;
use super::timing::{DEFAULT_DECREASE_RATIO, DEFAULT_MAX_INCREASE};

/// Seconds of history kept behind the newest snapshot.
pub const DEFAULT_HISTORY_TIME_LIMIT: f32 = 5.0;
/// Seconds a query may run past the newest snapshot before it is clamped.
pub const DEFAULT_EXTRAPOLATION_TIME: f32 = 0.25;

/// How far past the newest snapshot the interpolator may extrapolate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtrapolationLimit {
    Unlimited,
    /// Absolute cap in seconds.
    Time(f32),
    /// Cap as a fraction of the interval between the two newest snapshots.
    Ratio(f32),
}

impl Default for ExtrapolationLimit {
    fn default() -> Self {
        Self::Time(DEFAULT_EXTRAPOLATION_TIME)
    }
}

impl ExtrapolationLimit {
    /// Maximum extrapolation in seconds past a pair spanning `interval`.
    pub fn cap(&self, interval: f32) -> f32 {
        match *self {
            Self::Unlimited => f32::INFINITY,
            Self::Time(seconds) => seconds,
            Self::Ratio(ratio) => ratio * interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolatorConfig {
    pub history_time_limit: f32,
    pub extrapolation_limit: ExtrapolationLimit,
    /// Largest step (seconds) above the current estimate one observation
    /// can contribute to the latency/interval filters.
    pub max_increase: f32,
    /// Floor for a single decrease, as a fraction of the current estimate.
    pub decrease_ratio: f32,
    pub auto_cleanup: bool,
    pub initial_capacity: usize,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            history_time_limit: DEFAULT_HISTORY_TIME_LIMIT,
            extrapolation_limit: ExtrapolationLimit::default(),
            max_increase: DEFAULT_MAX_INCREASE,
            decrease_ratio: DEFAULT_DECREASE_RATIO,
            auto_cleanup: true,
            initial_capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("history time limit must be positive and finite, got {0}")]
    HistoryTimeLimit(f32),
    #[error("extrapolation limit must be non-negative and finite, got {0:?}")]
    ExtrapolationLimit(ExtrapolationLimit),
    #[error("max latency increase must be non-negative and finite, got {0}")]
    MaxIncrease(f32),
    #[error("decrease ratio must be within [0, 1], got {0}")]
    DecreaseRatio(f32),
}

impl InterpolatorConfig {
    pub fn with_history_time_limit(mut self, seconds: f32) -> Self {
        self.history_time_limit = seconds;
        self
    }

    pub fn with_extrapolation_limit(mut self, limit: ExtrapolationLimit) -> Self {
        self.extrapolation_limit = limit;
        self
    }

    pub fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.history_time_limit.is_finite() && self.history_time_limit > 0.0) {
            return Err(ConfigError::HistoryTimeLimit(self.history_time_limit));
        }

        match self.extrapolation_limit {
            ExtrapolationLimit::Unlimited => {}
            ExtrapolationLimit::Time(value) | ExtrapolationLimit::Ratio(value) => {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::ExtrapolationLimit(self.extrapolation_limit));
                }
            }
        }

        if !(self.max_increase.is_finite() && self.max_increase >= 0.0) {
            return Err(ConfigError::MaxIncrease(self.max_increase));
        }

        if !(0.0..=1.0).contains(&self.decrease_ratio) {
            return Err(ConfigError::DecreaseRatio(self.decrease_ratio));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(InterpolatorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let config = InterpolatorConfig::default().with_history_time_limit(0.0);
        assert_eq!(config.validate(), Err(ConfigError::HistoryTimeLimit(0.0)));

        let config = InterpolatorConfig::default().with_history_time_limit(f32::INFINITY);
        assert!(config.validate().is_err());

        let limit = ExtrapolationLimit::Ratio(-0.5);
        let config = InterpolatorConfig::default().with_extrapolation_limit(limit);
        assert_eq!(config.validate(), Err(ConfigError::ExtrapolationLimit(limit)));

        let config = InterpolatorConfig {
            max_increase: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MaxIncrease(_))));

        let config = InterpolatorConfig {
            decrease_ratio: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::DecreaseRatio(1.5)));
    }

    #[test]
    fn limit_caps() {
        assert_eq!(ExtrapolationLimit::Time(0.3).cap(2.0), 0.3);
        assert_eq!(ExtrapolationLimit::Ratio(0.5).cap(0.2), 0.1);
        assert!(ExtrapolationLimit::Unlimited.cap(1.0).is_infinite());
    }
}
