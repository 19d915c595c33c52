use serde::{Deserialize, Serialize};

/// One timestamped observation of the remote state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub remote_time: f32,
    pub value: T,
}

impl<T> Snapshot<T> {
    pub fn new(remote_time: f32, value: T) -> Self {
        Self { remote_time, value }
    }
}
