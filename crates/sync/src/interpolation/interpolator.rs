use std::fmt;

use super::config::{ConfigError, InterpolatorConfig};
use super::history::{HistoryBuffer, Iter};
use super::lerp::LerpStrategy;
use super::snapshot::Snapshot;
use super::timing::TimingEstimator;

/// Result of a query: the reconstructed value and how far the query time
/// lies past the newest snapshot used.
///
/// `slack` is NaN for an empty history, positive when extrapolating, zero
/// when the query was bracketed, and negative when it fell behind the
/// oldest snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate<T> {
    pub value: T,
    pub slack: f32,
}

impl<T> Estimate<T> {
    pub fn is_empty(&self) -> bool {
        self.slack.is_nan()
    }

    pub fn is_extrapolated(&self) -> bool {
        self.slack > 0.0
    }

    pub fn is_interpolated(&self) -> bool {
        self.slack <= 0.0
    }
}

/// Timestamped history of a remote value, sampled at arbitrary local times.
pub struct Interpolator<T, L> {
    config: InterpolatorConfig,
    history: HistoryBuffer<Snapshot<T>>,
    timing: TimingEstimator,
    lerp: L,
}

impl<T, L> fmt::Debug for Interpolator<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpolator")
            .field("config", &self.config)
            .field("len", &self.history.len())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl<T, L> Interpolator<T, L>
where
    T: Clone,
    L: LerpStrategy<T>,
{
    pub fn new(lerp: L) -> Self {
        Self::build(lerp, InterpolatorConfig::default())
    }

    pub fn with_config(lerp: L, config: InterpolatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(lerp, config))
    }

    pub fn with_history_limit(lerp: L, seconds: f32) -> Result<Self, ConfigError> {
        Self::with_config(
            lerp,
            InterpolatorConfig::default().with_history_time_limit(seconds),
        )
    }

    fn build(lerp: L, config: InterpolatorConfig) -> Self {
        Self {
            history: HistoryBuffer::with_capacity(config.initial_capacity),
            timing: TimingEstimator::new(config.max_increase, config.decrease_ratio),
            config,
            lerp,
        }
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    pub fn history_time_limit(&self) -> f32 {
        self.config.history_time_limit
    }

    pub fn auto_cleanup(&self) -> bool {
        self.config.auto_cleanup
    }

    pub fn set_auto_cleanup(&mut self, enabled: bool) {
        self.config.auto_cleanup = enabled;
    }

    pub fn latency(&self) -> f32 {
        self.timing.latency()
    }

    pub fn update_interval(&self) -> f32 {
        self.timing.update_interval()
    }

    pub fn delay(&self) -> f32 {
        self.timing.delay()
    }

    /// Remote time that should be on screen at `local_time`.
    pub fn interpolation_time(&self, local_time: f32) -> f32 {
        local_time - self.delay()
    }

    pub fn interpolation_time_scaled(&self, local_time: f32, multiplier: f32) -> f32 {
        local_time - self.delay() * multiplier
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Snapshot `index` places from the oldest end.
    pub fn get(&self, index: usize) -> Option<&Snapshot<T>> {
        self.history.get(index)
    }

    pub fn newest(&self) -> Option<&Snapshot<T>> {
        self.history.back()
    }

    pub fn oldest(&self) -> Option<&Snapshot<T>> {
        self.history.front()
    }

    pub fn iter(&self) -> Iter<'_, Snapshot<T>> {
        self.history.iter()
    }

    /// Records `value` as the remote state at `remote_time`, received at
    /// `local_time`.
    ///
    /// Returns `false` and leaves everything untouched when `remote_time` is
    /// not newer than the newest snapshot or either time is not finite.
    pub fn add_sample(&mut self, remote_time: f32, local_time: f32, value: T) -> bool {
        if !remote_time.is_finite() || !local_time.is_finite() {
            log::trace!("Rejected non-finite sample ({remote_time}, {local_time})");
            return false;
        }

        match self.history.back() {
            None => self.timing.seed(remote_time, local_time),
            Some(newest) if remote_time <= newest.remote_time => {
                log::trace!(
                    "Rejected sample at {remote_time}, newest is {}",
                    newest.remote_time
                );
                return false;
            }
            Some(newest) => {
                let interval = remote_time - newest.remote_time;
                self.timing.observe(remote_time, local_time, interval);
            }
        }

        self.history.push_back(Snapshot::new(remote_time, value));
        if self.config.auto_cleanup {
            self.evict(remote_time);
        }
        true
    }

    /// Discards the history and restarts from a single snapshot, seeding the
    /// timing estimates from it.
    pub fn reset(&mut self, remote_time: f32, local_time: f32, value: T) {
        log::debug!("Interpolator reset at remote time {remote_time}");
        self.history.clear();
        self.timing.seed(remote_time, local_time);
        self.history.push_back(Snapshot::new(remote_time, value));
    }

    pub fn clear(&mut self) {
        log::debug!("Interpolator cleared ({} snapshots)", self.history.len());
        self.history.clear();
        self.timing.reset();
    }

    /// Evicts snapshots older than the history window behind the newest one.
    pub fn cleanup(&mut self) {
        if let Some(newest) = self.history.back().map(|s| s.remote_time) {
            self.evict(newest);
        }
    }

    fn evict(&mut self, newest: f32) {
        let cutoff = newest - self.config.history_time_limit;
        let stale = self
            .history
            .iter()
            .take_while(|s| s.remote_time <= cutoff)
            .count();

        if stale > 0 {
            let removed = self.history.remove_front(stale);
            log::debug!("Evicted {removed} snapshots older than {cutoff}");
        }
    }

    /// Writes the estimate for `time` into `out` and returns the slack.
    ///
    /// `out` is left untouched when the history is empty.
    pub fn interpolate_into(&self, time: f32, out: &mut T) -> f32 {
        if time.is_nan() {
            return f32::NAN;
        }

        for offset in 1..self.history.len() {
            let (Some(to), Some(from)) = (
                self.history.peek_back(offset - 1),
                self.history.peek_back(offset),
            ) else {
                break;
            };

            if time <= from.remote_time {
                continue;
            }

            let span = to.remote_time - from.remote_time;
            let t = (time - from.remote_time) / span;
            if t <= 1.0 {
                *out = self.lerp.lerp(&from.value, &to.value, t);
                return 0.0;
            }

            let extrapolation = time - to.remote_time;
            let cap = self.config.extrapolation_limit.cap(span);
            if extrapolation > cap {
                *out = self.lerp.lerp(&from.value, &to.value, 1.0 + cap / span);
                return cap;
            }

            *out = self.lerp.lerp(&from.value, &to.value, t);
            return extrapolation;
        }

        match self.history.front() {
            Some(oldest) => {
                *out = oldest.value.clone();
                time - oldest.remote_time
            }
            None => f32::NAN,
        }
    }

    pub fn interpolate(&self, time: f32) -> Estimate<T>
    where
        T: Default,
    {
        let mut value = T::default();
        let slack = self.interpolate_into(time, &mut value);
        Estimate { value, slack }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::config::ExtrapolationLimit;
    use crate::interpolation::lerp::Linear;
    use approx::assert_abs_diff_eq;

    fn filled(times: &[f32]) -> Interpolator<f32, Linear> {
        let config = InterpolatorConfig::default()
            .with_extrapolation_limit(ExtrapolationLimit::Time(1.0));
        let mut interpolator = Interpolator::with_config(Linear, config).unwrap();
        for &time in times {
            assert!(interpolator.add_sample(time, time, time));
        }
        interpolator
    }

    #[test]
    fn empty_history_has_nan_slack() {
        let interpolator = Interpolator::<f32, _>::new(Linear);
        let mut out = 7.0;

        assert!(interpolator.interpolate_into(1.0, &mut out).is_nan());
        assert_eq!(out, 7.0);
        assert!(interpolator.interpolate(1.0).is_empty());
    }

    #[test]
    fn single_entry_returns_it() {
        let interpolator = filled(&[2.0]);

        let ahead = interpolator.interpolate(2.5);
        assert_eq!(ahead.value, 2.0);
        assert_eq!(ahead.slack, 0.5);

        let behind = interpolator.interpolate(1.0);
        assert_eq!(behind.value, 2.0);
        assert_eq!(behind.slack, -1.0);
    }

    #[test]
    fn exact_hits() {
        let interpolator = filled(&[0.0, 1.0, 2.0]);

        let newest = interpolator.interpolate(2.0);
        assert_eq!(newest.value, 2.0);
        assert_eq!(newest.slack, 0.0);

        let oldest = interpolator.interpolate(0.0);
        assert_eq!(oldest.value, 0.0);
        assert_eq!(oldest.slack, 0.0);

        assert_eq!(interpolator.interpolate(1.0).value, 1.0);
    }

    #[test]
    fn ratio_limit_scales_with_interval() {
        let config = InterpolatorConfig::default()
            .with_extrapolation_limit(ExtrapolationLimit::Ratio(0.5));
        let mut interpolator = Interpolator::with_config(Linear, config).unwrap();
        interpolator.add_sample(0.0, 0.0, 0.0);
        interpolator.add_sample(2.0, 2.0, 4.0);

        let estimate = interpolator.interpolate(5.0);
        assert_eq!(estimate.slack, 1.0);
        assert_abs_diff_eq!(estimate.value, 6.0, epsilon = 1e-6);
    }

    #[test]
    fn unlimited_extrapolation() {
        let config = InterpolatorConfig::default()
            .with_extrapolation_limit(ExtrapolationLimit::Unlimited);
        let mut interpolator = Interpolator::with_config(Linear, config).unwrap();
        interpolator.add_sample(0.0, 0.0, 0.0);
        interpolator.add_sample(1.0, 1.0, 1.0);

        let estimate = interpolator.interpolate(11.0);
        assert_eq!(estimate.slack, 10.0);
        assert_abs_diff_eq!(estimate.value, 11.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_non_finite_times() {
        let mut interpolator = filled(&[0.0]);

        assert!(!interpolator.add_sample(f32::NAN, 1.0, 1.0));
        assert!(!interpolator.add_sample(1.0, f32::INFINITY, 1.0));
        assert_eq!(interpolator.len(), 1);
    }

    #[test]
    fn nan_query() {
        let interpolator = filled(&[0.0, 1.0]);
        assert!(interpolator.interpolate(f32::NAN).is_empty());
    }

    #[test]
    fn reset_seeds_timing() {
        let mut interpolator = filled(&[0.0, 1.0, 2.0]);
        interpolator.reset(10.0, 10.25, 42.0);

        assert_eq!(interpolator.len(), 1);
        assert_eq!(interpolator.latency(), 0.25);
        assert_eq!(interpolator.update_interval(), 0.25);
        assert_eq!(interpolator.interpolate(10.0).value, 42.0);
    }

    #[test]
    fn interpolation_time_lags_by_delay() {
        let mut interpolator = Interpolator::new(Linear);
        interpolator.add_sample(0.0, 0.1, 0.0f32);

        let delay = interpolator.delay();
        assert_abs_diff_eq!(delay, 0.2 * 1.03, epsilon = 1e-6);
        assert_abs_diff_eq!(interpolator.interpolation_time(1.0), 1.0 - delay, epsilon = 1e-6);
        assert_abs_diff_eq!(
            interpolator.interpolation_time_scaled(1.0, 2.0),
            1.0 - 2.0 * delay,
            epsilon = 1e-6
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let result = Interpolator::<f32, _>::with_history_limit(Linear, -1.0);
        assert!(matches!(result, Err(ConfigError::HistoryTimeLimit(_))));
    }
}
