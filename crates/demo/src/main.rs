mod channel;
mod config;
mod packet;
mod session;

use anyhow::Result;
use clap::Parser;

use snapsync::ExtrapolationLimit;

use channel::ChannelConfig;
use config::DemoConfig;
use session::Session;

#[derive(Parser)]
#[command(name = "snapsync-demo")]
#[command(about = "Replays a moving pose through a lossy link and measures reconstruction error")]
struct Args {
    #[arg(short, long, default_value_t = 10.0, help = "Simulated seconds to run")]
    duration: f32,

    #[arg(short, long, default_value_t = 20, help = "Snapshots sent per second")]
    send_rate: u32,

    #[arg(short, long, default_value_t = 60, help = "Interpolator queries per second")]
    frame_rate: u32,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 50, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 100, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, default_value_t = 5.0, help = "Seconds of history to keep")]
    history: f32,

    #[arg(long, default_value_t = 0.25, help = "Extrapolation cap in seconds")]
    extrapolation: f32,

    #[arg(long, help = "Extrapolation cap as a fraction of the last snapshot interval")]
    extrapolation_ratio: Option<f32>,

    #[arg(long, help = "Extrapolate without a cap")]
    unlimited_extrapolation: bool,

    #[arg(long, help = "Seed for the simulated link")]
    seed: Option<u64>,
}

impl Args {
    fn extrapolation_limit(&self) -> ExtrapolationLimit {
        if self.unlimited_extrapolation {
            ExtrapolationLimit::Unlimited
        } else if let Some(ratio) = self.extrapolation_ratio {
            ExtrapolationLimit::Ratio(ratio)
        } else {
            ExtrapolationLimit::Time(self.extrapolation)
        }
    }

    fn into_config(self) -> DemoConfig {
        let defaults = DemoConfig::default();
        let interpolator = defaults
            .interpolator
            .clone()
            .with_history_time_limit(self.history)
            .with_extrapolation_limit(self.extrapolation_limit());

        DemoConfig {
            send_rate: self.send_rate,
            frame_rate: self.frame_rate,
            duration_secs: self.duration,
            seed: self.seed,
            channel: ChannelConfig {
                loss_percent: self.loss_percent,
                min_latency_ms: self.min_latency,
                max_latency_ms: self.max_latency,
                jitter_ms: self.jitter,
            },
            interpolator,
            ..defaults
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    log::info!(
        "Sending {} snapshots/s over {:?}, extrapolation {:?}",
        config.send_rate,
        config.channel,
        config.interpolator.extrapolation_limit
    );

    let mut session = Session::new(config)?;
    session.run()?;

    let report = session.report();
    let stats = session.channel().stats();
    log::info!(
        "Finished at t={:.2}s: {} frames ({} interpolated, {} extrapolated, {} empty)",
        session.clock(),
        report.frames,
        report.interpolated,
        report.extrapolated,
        report.empty
    );
    log::info!(
        "Link: {} sent, {} dropped ({:.1}%), {} delivered, {} still in flight, {} bytes",
        stats.packets_sent,
        stats.packets_dropped,
        stats.loss_percent(),
        stats.packets_delivered,
        session.channel().in_flight(),
        stats.bytes_sent
    );
    log::info!(
        "Receiver: {} accepted, {} late, {} malformed, {} buffered",
        report.accepted,
        report.rejected,
        report.malformed,
        session.interpolator().len()
    );
    log::info!(
        "Position error: mean {:.4}, max {:.4}; heading error max {:.4} rad",
        report.mean_error(),
        report.max_error,
        report.max_heading_error
    );

    Ok(())
}
