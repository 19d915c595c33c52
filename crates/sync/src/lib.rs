pub mod compression;
pub mod interpolation;

pub use compression::{DirectionCode, Half, QuatCode};
pub use interpolation::{
    ConfigError, Estimate, ExtrapolationLimit, HistoryBuffer, Interpolator, InterpolatorConfig,
    LerpStrategy, Linear, Pose, PoseLerp, Snapshot, Spherical, TimingEstimator,
};
