//! Smoothed estimates of network latency and update interval.
//!
//! Both values follow an asymmetric exponential filter: they move toward a
//! higher observation with weight 1/8 and toward a lower one with weight
//! 1/32. A spike is tracked quickly, a transient improvement decays slowly.

/// Weight divisor applied when the observation is above the estimate.
pub const INCREASE_DIVISOR: f32 = 8.0;
/// Weight divisor applied when the observation is at or below the estimate.
pub const DECREASE_DIVISOR: f32 = 32.0;
/// Margin added on top of `update_interval + latency` by [`TimingEstimator::delay`].
pub const DELAY_PADDING: f32 = 1.03;

pub const DEFAULT_MAX_INCREASE: f32 = 0.5;
pub const DEFAULT_DECREASE_RATIO: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEstimator {
    latency: f32,
    update_interval: f32,
    max_increase: f32,
    decrease_ratio: f32,
}

impl Default for TimingEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INCREASE, DEFAULT_DECREASE_RATIO)
    }
}

impl TimingEstimator {
    /// `max_increase` caps how far above the current estimate an observation
    /// may pull it (seconds); `decrease_ratio` floors a single decrease at
    /// that fraction of the current estimate.
    pub fn new(max_increase: f32, decrease_ratio: f32) -> Self {
        Self {
            latency: 0.0,
            update_interval: 0.0,
            max_increase,
            decrease_ratio,
        }
    }

    pub fn latency(&self) -> f32 {
        self.latency
    }

    pub fn update_interval(&self) -> f32 {
        self.update_interval
    }

    /// How far behind the local clock playback should run.
    pub fn delay(&self) -> f32 {
        (self.update_interval + self.latency) * DELAY_PADDING
    }

    /// Sets both estimates from a single observation, skipping the filter.
    pub fn seed(&mut self, remote_time: f32, local_time: f32) {
        let latency = observed_latency(remote_time, local_time);
        self.latency = latency;
        self.update_interval = latency;
    }

    /// Folds in a sample that arrived `interval` seconds of remote time
    /// after the previous one.
    pub fn observe(&mut self, remote_time: f32, local_time: f32, interval: f32) {
        let latency = observed_latency(remote_time, local_time);
        self.latency = self.smooth(self.latency, latency);
        self.update_interval = self.smooth(self.update_interval, interval);
    }

    pub fn reset(&mut self) {
        self.latency = 0.0;
        self.update_interval = 0.0;
    }

    fn smooth(&self, buffered: f32, observed: f32) -> f32 {
        if observed > buffered {
            let observed = observed.min(buffered + self.max_increase);
            (buffered * (INCREASE_DIVISOR - 1.0) + observed) / INCREASE_DIVISOR
        } else {
            let blended = (buffered * (DECREASE_DIVISOR - 1.0) + observed) / DECREASE_DIVISOR;
            blended.max(buffered * self.decrease_ratio)
        }
    }
}

fn observed_latency(remote_time: f32, local_time: f32) -> f32 {
    (local_time - remote_time).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn seed_bypasses_filter() {
        let mut timing = TimingEstimator::default();
        timing.seed(10.0, 10.2);

        assert_abs_diff_eq!(timing.latency(), 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(timing.update_interval(), 0.2, epsilon = 1e-5);
    }

    #[test]
    fn negative_latency_clamps_to_zero() {
        let mut timing = TimingEstimator::default();
        timing.seed(5.0, 4.0);
        assert_eq!(timing.latency(), 0.0);

        timing.observe(6.0, 5.5, 1.0);
        assert_eq!(timing.latency(), 0.0);
    }

    #[test]
    fn rises_fast_and_decays_slowly() {
        let mut timing = TimingEstimator::new(10.0, 0.0);
        timing.seed(0.0, 0.1);

        timing.observe(1.0, 1.9, 0.1);
        // (0.1 * 7 + 0.9) / 8
        assert_abs_diff_eq!(timing.latency(), 0.2, epsilon = 1e-6);

        timing.observe(2.0, 2.0, 0.1);
        // (0.2 * 31 + 0.0) / 32
        assert_abs_diff_eq!(timing.latency(), 0.19375, epsilon = 1e-6);
    }

    #[test]
    fn increase_is_bounded() {
        let mut timing = TimingEstimator::new(0.5, DEFAULT_DECREASE_RATIO);
        timing.seed(0.0, 0.1);

        timing.observe(1.0, 11.0, 0.1);
        // observation clamped to 0.1 + 0.5
        assert_abs_diff_eq!(timing.latency(), (0.1 * 7.0 + 0.6) / 8.0, epsilon = 1e-6);
    }

    #[test]
    fn grows_from_zero() {
        let mut timing = TimingEstimator::default();
        timing.seed(0.0, 0.0);

        for step in 1..=50 {
            let remote = step as f32 * 0.1;
            timing.observe(remote, remote + 0.3, 0.1);
        }

        assert!(timing.latency() > 0.29 && timing.latency() <= 0.3);
        assert_abs_diff_eq!(timing.update_interval(), 0.1, epsilon = 1e-3);
    }

    #[test]
    fn decrease_is_floored() {
        let mut timing = TimingEstimator::new(DEFAULT_MAX_INCREASE, 0.99);
        timing.seed(0.0, 1.0);

        timing.observe(1.0, 1.0, 0.1);
        assert_abs_diff_eq!(timing.latency(), 0.99, epsilon = 1e-6);
    }

    #[test]
    fn delay_is_padded_sum() {
        let mut timing = TimingEstimator::default();
        timing.seed(0.0, 0.05);
        assert_abs_diff_eq!(timing.delay(), 0.1 * DELAY_PADDING, epsilon = 1e-6);

        timing.reset();
        assert_eq!(timing.delay(), 0.0);
    }
}
