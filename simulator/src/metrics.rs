use plinko_types::{Event, Outcome, Snapshot};
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};
use std::sync::atomic::AtomicU64;

/// Prometheus view of a session.
#[derive(Debug)]
pub struct Metrics {
    registry: Registry,

    drops_accepted: Counter<u64, AtomicU64>,
    drops_rejected: Counter<u64, AtomicU64>,
    balls_settled: Counter<u64, AtomicU64>,
    wins: Counter<u64, AtomicU64>,
    losses: Counter<u64, AtomicU64>,

    active_balls: Gauge,
    balance: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let drops_accepted: Counter<u64, AtomicU64> = Counter::default();
        let drops_rejected: Counter<u64, AtomicU64> = Counter::default();
        let balls_settled: Counter<u64, AtomicU64> = Counter::default();
        let wins: Counter<u64, AtomicU64> = Counter::default();
        let losses: Counter<u64, AtomicU64> = Counter::default();
        let active_balls = Gauge::default();
        let balance = Gauge::default();
        registry.register(
            "drops_accepted",
            "Number of drops paid for and released",
            drops_accepted.clone(),
        );
        registry.register(
            "drops_rejected",
            "Number of drops rejected for insufficient balance",
            drops_rejected.clone(),
        );
        registry.register(
            "balls_settled",
            "Number of balls that landed in a slot",
            balls_settled.clone(),
        );
        registry.register("wins", "Number of settled balls paying more than 1x", wins.clone());
        registry.register(
            "losses",
            "Number of settled balls paying 1x or less",
            losses.clone(),
        );
        registry.register(
            "active_balls",
            "Balls currently in flight",
            active_balls.clone(),
        );
        registry.register("balance", "Player balance in minor units", balance.clone());

        Self {
            registry,
            drops_accepted,
            drops_rejected,
            balls_settled,
            wins,
            losses,
            active_balls,
            balance,
        }
    }

    pub fn observe(&self, events: &[Event], snapshot: &Snapshot) {
        for event in events {
            match event {
                Event::DropAccepted { .. } => {
                    self.drops_accepted.inc();
                }
                Event::DropRejected { .. } => {
                    self.drops_rejected.inc();
                }
                Event::BallSettled { outcome, .. } => {
                    self.balls_settled.inc();
                    match outcome {
                        Outcome::Win => self.wins.inc(),
                        Outcome::Loss => self.losses.inc(),
                    };
                }
                _ => {}
            }
        }
        self.active_balls.set(snapshot.active_balls as i64);
        self.balance
            .set(i64::try_from(snapshot.account.balance).unwrap_or(i64::MAX));
    }

    /// Render in the prometheus text format.
    pub fn encode(&self) -> Option<String> {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &self.registry) {
            tracing::error!("Failed to encode metrics: {}", e);
            return None;
        }
        Some(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
