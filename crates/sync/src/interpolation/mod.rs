mod config;
mod history;
mod interpolator;
mod lerp;
mod snapshot;
mod timing;

pub use config::{
    ConfigError, DEFAULT_EXTRAPOLATION_TIME, DEFAULT_HISTORY_TIME_LIMIT, ExtrapolationLimit,
    InterpolatorConfig,
};
pub use history::{DEFAULT_CAPACITY, HistoryBuffer, Iter};
pub use interpolator::{Estimate, Interpolator};
pub use lerp::{LerpStrategy, Linear, Pose, PoseLerp, Spherical, slerp_unclamped};
pub use snapshot::Snapshot;
pub use timing::{DELAY_PADDING, TimingEstimator};
