use serde::{Deserialize, Serialize};
use snapsync::InterpolatorConfig;

use crate::channel::ChannelConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Snapshots produced per second of remote time.
    pub send_rate: u32,
    /// Interpolator queries per second of local time.
    pub frame_rate: u32,
    pub duration_secs: f32,
    /// Radius of the circle the remote pose travels along.
    pub path_radius: f32,
    /// Angular speed along the path, radians per second.
    pub path_speed: f32,
    pub seed: Option<u64>,
    pub channel: ChannelConfig,
    pub interpolator: InterpolatorConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            send_rate: 20,
            frame_rate: 60,
            duration_secs: 10.0,
            path_radius: 5.0,
            path_speed: 1.0,
            seed: None,
            channel: ChannelConfig::default(),
            interpolator: InterpolatorConfig::default(),
        }
    }
}

impl DemoConfig {
    pub fn send_interval(&self) -> f32 {
        1.0 / self.send_rate.max(1) as f32
    }

    pub fn frame_interval(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}
