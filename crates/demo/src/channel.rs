use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Loss and latency profile of the simulated link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub loss_percent: f32,
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub jitter_ms: u32,
}

impl ChannelConfig {
    pub fn should_drop(&self, rng: &mut impl Rng) -> bool {
        if self.loss_percent <= 0.0 {
            return false;
        }
        rng.random::<f32>() * 100.0 < self.loss_percent
    }

    pub fn delay_ms(&self, rng: &mut impl Rng) -> u32 {
        let base = self.min_latency_ms;
        let range = self.max_latency_ms.saturating_sub(self.min_latency_ms);
        let spread = if range > 0 { rng.random_range(0..=range) } else { 0 };
        let jitter = if self.jitter_ms > 0 {
            rng.random_range(0..=self.jitter_ms)
        } else {
            0
        };
        base + spread + jitter
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelStats {
    pub packets_sent: u64,
    pub packets_dropped: u64,
    pub packets_delivered: u64,
    pub bytes_sent: u64,
}

impl ChannelStats {
    pub fn loss_percent(&self) -> f32 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        self.packets_dropped as f32 / self.packets_sent as f32 * 100.0
    }
}

#[derive(Debug)]
struct InFlight {
    release_time: f32,
    datagram: Vec<u8>,
}

impl PartialEq for InFlight {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InFlight {}

impl PartialOrd for InFlight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InFlight {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other.release_time.total_cmp(&self.release_time)
    }
}

/// One-way datagram link driven by an external clock in seconds.
///
/// Datagrams are dropped or delayed according to [`ChannelConfig`]; random
/// delays mean they can come out in a different order than they went in.
#[derive(Debug)]
pub struct SimulatedChannel {
    config: ChannelConfig,
    rng: StdRng,
    in_flight: BinaryHeap<InFlight>,
    stats: ChannelStats,
}

impl SimulatedChannel {
    pub fn new(config: ChannelConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            in_flight: BinaryHeap::new(),
            stats: ChannelStats::default(),
        }
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn send(&mut self, now: f32, datagram: Vec<u8>) {
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += datagram.len() as u64;

        if self.config.should_drop(&mut self.rng) {
            self.stats.packets_dropped += 1;
            return;
        }

        let delay = self.config.delay_ms(&mut self.rng) as f32 / 1000.0;
        self.in_flight.push(InFlight {
            release_time: now + delay,
            datagram,
        });
    }

    /// Datagrams whose delay has elapsed by `now`, earliest first.
    pub fn receive(&mut self, now: f32) -> Vec<Vec<u8>> {
        let mut ready = Vec::new();
        while self
            .in_flight
            .peek()
            .is_some_and(|packet| packet.release_time <= now)
        {
            if let Some(packet) = self.in_flight.pop() {
                ready.push(packet.datagram);
            }
        }
        self.stats.packets_delivered += ready.len() as u64;
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossless_link_delivers_in_order() {
        let config = ChannelConfig {
            min_latency_ms: 100,
            max_latency_ms: 100,
            ..Default::default()
        };
        let mut channel = SimulatedChannel::new(config, Some(1));

        channel.send(0.0, vec![1]);
        channel.send(0.05, vec![2]);

        assert!(channel.receive(0.09).is_empty());
        assert_eq!(channel.receive(0.1), vec![vec![1]]);
        assert_eq!(channel.receive(0.2), vec![vec![2]]);
        assert_eq!(channel.stats().packets_delivered, 2);
    }

    #[test]
    fn test_total_loss() {
        let config = ChannelConfig {
            loss_percent: 100.0,
            ..Default::default()
        };
        let mut channel = SimulatedChannel::new(config, Some(2));

        for step in 0..10 {
            channel.send(step as f32, vec![0; 8]);
        }

        assert!(channel.receive(100.0).is_empty());
        assert_eq!(channel.stats().packets_dropped, 10);
        assert_eq!(channel.stats().bytes_sent, 80);
        assert_eq!(channel.stats().loss_percent(), 100.0);
    }

    #[test]
    fn test_delay_stays_in_range() {
        let config = ChannelConfig {
            min_latency_ms: 20,
            max_latency_ms: 60,
            jitter_ms: 10,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..1000 {
            let delay = config.delay_ms(&mut rng);
            assert!((20..=70).contains(&delay));
        }
    }
}
