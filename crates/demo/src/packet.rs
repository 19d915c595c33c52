use glam::{Quat, Vec3};
use rkyv::{Archive, Deserialize, Serialize, rancor};

use snapsync::Pose;
use snapsync::compression::{direction, half, quaternion};

/// One pose snapshot as it travels over the wire: half-float position,
/// smallest-three rotation and a folded heading direction.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PosePacket {
    pub remote_time: f32,
    pub position: [u16; 3],
    pub rotation: u32,
    pub heading: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl PosePacket {
    pub fn encode(remote_time: f32, pose: &Pose) -> Self {
        let heading = (pose.rotation * Vec3::Z).normalize();
        Self {
            remote_time,
            position: pose.position.to_array().map(half::encode),
            rotation: quaternion::pack_u32(pose.rotation.normalize()),
            heading: direction::pack_u16(heading),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position.map(half::decode))
    }

    pub fn rotation(&self) -> Quat {
        quaternion::unpack(self.rotation)
    }

    pub fn heading(&self) -> Vec3 {
        direction::unpack(self.heading)
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position(), self.rotation())
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)
    }
}
