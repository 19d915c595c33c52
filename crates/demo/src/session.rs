use anyhow::Result;
use glam::{Quat, Vec3};

use snapsync::{Interpolator, Pose, PoseLerp};

use crate::channel::SimulatedChannel;
use crate::config::DemoConfig;
use crate::packet::PosePacket;

/// Ground truth the sender samples: a steady walk around a circle, facing
/// along the direction of travel.
#[derive(Debug, Clone, Copy)]
pub struct CirclePath {
    pub radius: f32,
    pub speed: f32,
}

impl CirclePath {
    pub fn pose_at(&self, time: f32) -> Pose {
        let angle = time * self.speed;
        let position = Vec3::new(angle.cos() * self.radius, 1.0, angle.sin() * self.radius);
        Pose::new(position, Quat::from_rotation_y(-angle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    pub frames: u64,
    pub interpolated: u64,
    pub extrapolated: u64,
    pub empty: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub total_error: f32,
    pub max_error: f32,
    pub max_heading_error: f32,
}

impl SessionReport {
    pub fn mean_error(&self) -> f32 {
        let rendered = self.frames - self.empty;
        if rendered == 0 {
            return 0.0;
        }
        self.total_error / rendered as f32
    }
}

/// Sender, lossy link and receiver sharing one simulated clock.
pub struct Session {
    config: DemoConfig,
    path: CirclePath,
    channel: SimulatedChannel,
    interpolator: Interpolator<Pose, PoseLerp>,
    report: SessionReport,
    clock: f32,
    next_send: f32,
}

impl Session {
    pub fn new(config: DemoConfig) -> Result<Self> {
        let interpolator = Interpolator::with_config(PoseLerp, config.interpolator.clone())?;
        let channel = SimulatedChannel::new(config.channel.clone(), config.seed);
        let path = CirclePath {
            radius: config.path_radius,
            speed: config.path_speed,
        };

        Ok(Self {
            config,
            path,
            channel,
            interpolator,
            report: SessionReport::default(),
            clock: 0.0,
            next_send: 0.0,
        })
    }

    pub fn interpolator(&self) -> &Interpolator<Pose, PoseLerp> {
        &self.interpolator
    }

    pub fn channel(&self) -> &SimulatedChannel {
        &self.channel
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.clock >= self.config.duration_secs
    }

    pub fn run(&mut self) -> Result<&SessionReport> {
        let report_every = self.config.frame_rate.max(1) as u64;
        while !self.is_finished() {
            self.step()?;
            if self.report.frames % report_every == 0 {
                log::info!(
                    "t={:.1}s latency={:.0}ms interval={:.0}ms delay={:.0}ms mean error={:.4}",
                    self.clock,
                    self.interpolator.latency() * 1000.0,
                    self.interpolator.update_interval() * 1000.0,
                    self.interpolator.delay() * 1000.0,
                    self.report.mean_error(),
                );
            }
        }
        Ok(&self.report)
    }

    /// Advances the shared clock by one frame: sends any due snapshot,
    /// delivers arrived packets and samples the interpolator.
    pub fn step(&mut self) -> Result<()> {
        self.clock += self.config.frame_interval();
        let now = self.clock;

        while self.next_send <= now {
            let pose = self.path.pose_at(self.next_send);
            let packet = PosePacket::encode(self.next_send, &pose);
            self.channel.send(self.next_send, packet.serialize()?);
            self.next_send += self.config.send_interval();
        }

        for datagram in self.channel.receive(now) {
            self.deliver(now, &datagram);
        }

        self.render(now);
        Ok(())
    }

    fn deliver(&mut self, now: f32, datagram: &[u8]) {
        let packet = match PosePacket::deserialize(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("Dropping malformed packet: {}", e);
                self.report.malformed += 1;
                return;
            }
        };

        let heading = packet.pose().rotation * Vec3::Z;
        let heading_error = packet.heading().dot(heading).clamp(-1.0, 1.0).acos();
        self.report.max_heading_error = self.report.max_heading_error.max(heading_error);

        if self
            .interpolator
            .add_sample(packet.remote_time, now, packet.pose())
        {
            self.report.accepted += 1;
        } else {
            log::debug!("Late packet for t={:.3}", packet.remote_time);
            self.report.rejected += 1;
        }
    }

    fn render(&mut self, now: f32) {
        self.report.frames += 1;

        let render_time = self.interpolator.interpolation_time(now);
        let estimate = self.interpolator.interpolate(render_time);
        if estimate.is_empty() {
            self.report.empty += 1;
            return;
        }

        if estimate.is_extrapolated() {
            self.report.extrapolated += 1;
        } else {
            self.report.interpolated += 1;
        }

        let truth = self.path.pose_at(render_time);
        let error = estimate.value.position.distance(truth.position);
        self.report.total_error += error;
        self.report.max_error = self.report.max_error.max(error);
    }
}
