//! Fixed-width lossy encodings for values carried in snapshots.

pub mod direction;
pub mod half;
pub mod quaternion;

pub use direction::DirectionCode;
pub use half::Half;
pub use quaternion::QuatCode;
