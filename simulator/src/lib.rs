use plinko_execution::{rtp, Session};
use plinko_types::{
    default_slot_tags, BallView, BoardConfig, Event, Multiplier, SlotTag, Snapshot, Timing,
    DEFAULT_BALLS_PER_DROP, DEFAULT_BET_COST, DEFAULT_MULTIPLIERS_BPS, DEFAULT_ROWS,
    DEFAULT_SETTLE_PAUSE, DEFAULT_STAGGER, DEFAULT_START_BALANCE, DEFAULT_TICK_INTERVAL,
    MULTIPLIER_SCALE,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::Level;

mod api;
pub use api::Api;
mod metrics;
pub use metrics::Metrics;

/// Configuration for the [Simulator], read from YAML. Every field has a
/// default, so an empty file plays the standard board.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_rows")]
    pub rows: u8,
    #[serde(default = "default_bet_cost")]
    pub bet_cost: u64,
    #[serde(default = "default_balls_per_drop")]
    pub balls_per_drop: u32,
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<f64>,
    #[serde(default = "default_slot_tags")]
    pub slot_tags: Vec<SlotTag>,
    #[serde(default = "default_start_balance")]
    pub start_balance: u64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_settle_pause_ms")]
    pub settle_pause_ms: u64,
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid board: {0}")]
    Board(#[from] plinko_types::ConfigError),
    #[error("multiplier {index} is invalid: {value}")]
    InvalidMultiplier { index: usize, value: f64 },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
}

pub struct ValidatedConfig {
    pub board: BoardConfig,
    pub start_balance: u64,
    pub log_level: Level,
    pub port: u16,
    pub seed: Option<u64>,
}

fn default_rows() -> u8 {
    DEFAULT_ROWS
}

fn default_bet_cost() -> u64 {
    DEFAULT_BET_COST
}

fn default_balls_per_drop() -> u32 {
    DEFAULT_BALLS_PER_DROP
}

fn default_multipliers() -> Vec<f64> {
    DEFAULT_MULTIPLIERS_BPS
        .iter()
        .map(|bps| *bps as f64 / MULTIPLIER_SCALE as f64)
        .collect()
}

fn default_start_balance() -> u64 {
    DEFAULT_START_BALANCE
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL.as_millis() as u64
}

fn default_settle_pause_ms() -> u64 {
    DEFAULT_SETTLE_PAUSE.as_millis() as u64
}

fn default_stagger_ms() -> u64 {
    DEFAULT_STAGGER.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            bet_cost: default_bet_cost(),
            balls_per_drop: default_balls_per_drop(),
            multipliers: default_multipliers(),
            slot_tags: default_slot_tags(),
            start_balance: default_start_balance(),
            tick_interval_ms: default_tick_interval_ms(),
            settle_pause_ms: default_settle_pause_ms(),
            stagger_ms: default_stagger_ms(),
            log_level: default_log_level(),
            port: default_port(),
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let multipliers = self
            .multipliers
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                Multiplier::from_f64(value).ok_or(ConfigError::InvalidMultiplier { index, value })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let timing = Timing {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            settle_pause: Duration::from_millis(self.settle_pause_ms),
            stagger: Duration::from_millis(self.stagger_ms),
        };
        let board = BoardConfig::new(
            self.rows,
            self.bet_cost,
            self.balls_per_drop,
            multipliers,
            self.slot_tags,
            timing,
        )?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            board,
            start_balance: self.start_balance,
            log_level,
            port: self.port,
            seed: self.seed,
        })
    }
}

/// Everything that changed during one mutation, pushed to update subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Update {
    pub events: Vec<Event>,
    pub snapshot: Snapshot,
}

/// Static description of the board for renderers.
#[derive(Clone, Debug, Serialize)]
pub struct BoardInfo {
    pub rows: u8,
    pub bet_cost: u64,
    pub balls_per_drop: u32,
    pub multiplier_scale: u32,
    pub multipliers: Vec<Multiplier>,
    pub slot_tags: Vec<SlotTag>,
    pub tick_interval_ms: u64,
    pub settle_pause_ms: u64,
    pub stagger_ms: u64,
    pub expected_return: f64,
}

impl BoardInfo {
    fn new(config: &BoardConfig) -> Self {
        let timing = config.timing();
        Self {
            rows: config.rows(),
            bet_cost: config.bet_cost(),
            balls_per_drop: config.balls_per_drop(),
            multiplier_scale: MULTIPLIER_SCALE,
            multipliers: config.multipliers().to_vec(),
            slot_tags: config.slot_tags().to_vec(),
            tick_interval_ms: timing.tick_interval.as_millis() as u64,
            settle_pause_ms: timing.settle_pause.as_millis() as u64,
            stagger_ms: timing.stagger.as_millis() as u64,
            expected_return: rtp::expected_multiplier(config),
        }
    }
}

/// A drop session shared between the API handlers and the clock driver.
///
/// Every operation holds the session lock for its whole duration, so the funds
/// check, debit and spawn of a drop can never interleave with another request.
pub struct Simulator {
    board: BoardInfo,
    session: Mutex<Session<ChaCha8Rng>>,
    started: Instant,
    update_tx: broadcast::Sender<Update>,
    metrics: Metrics,
}

impl Simulator {
    pub fn new(config: Arc<BoardConfig>, start_balance: u64, rng: ChaCha8Rng) -> Self {
        let (update_tx, _) = broadcast::channel(1024);
        let board = BoardInfo::new(&config);
        let metrics = Metrics::new();
        let session = Session::new(config, start_balance, rng);
        metrics.observe(&[], &session.snapshot());

        Self {
            board,
            session: Mutex::new(session),
            started: Instant::now(),
            update_tx,
            metrics,
        }
    }

    fn lock(&self, operation: &str) -> Option<MutexGuard<'_, Session<ChaCha8Rng>>> {
        match self.session.lock() {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::error!("Failed to acquire session lock in {}: {}", operation, e);
                None
            }
        }
    }

    /// Publish whatever the last operation produced.
    ///
    /// Takes the guard so the update is sent before the lock is released and
    /// subscribers see updates in the order the session changed.
    fn publish(&self, session: &mut MutexGuard<'_, Session<ChaCha8Rng>>) {
        let events = session.drain_events();
        if events.is_empty() {
            return;
        }
        let snapshot = session.snapshot();
        self.metrics.observe(&events, &snapshot);
        if let Err(e) = self.update_tx.send(Update { events, snapshot }) {
            tracing::debug!("No update subscribers: {}", e);
        }
    }

    /// Pay for and release one drop.
    pub fn request_drop(&self) -> bool {
        let Some(mut session) = self.lock("request_drop") else {
            return false;
        };
        let accepted = session.request_drop();
        self.publish(&mut session);
        accepted
    }

    /// Move the session clock to `now` since start.
    pub fn advance_to(&self, now: Duration) -> usize {
        let Some(mut session) = self.lock("advance_to") else {
            return 0;
        };
        let fired = session.advance_to(now);
        self.publish(&mut session);
        fired
    }

    /// Move the session clock forward by `delta`.
    pub fn advance_by(&self, delta: Duration) -> usize {
        let Some(mut session) = self.lock("advance_by") else {
            return 0;
        };
        let fired = session.advance_by(delta);
        self.publish(&mut session);
        fired
    }

    /// Catch the session clock up with wall-clock time.
    pub fn tick(&self) -> usize {
        self.advance_to(self.started.elapsed())
    }

    /// Settle everything in flight without waiting for wall-clock time.
    pub fn run_until_idle(&self) -> usize {
        let Some(mut session) = self.lock("run_until_idle") else {
            return 0;
        };
        let fired = session.run_until_idle();
        self.publish(&mut session);
        fired
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        Some(self.lock("snapshot")?.snapshot())
    }

    pub fn balls(&self) -> Option<Vec<BallView>> {
        Some(self.lock("balls")?.balls().collect())
    }

    pub fn board(&self) -> &BoardInfo {
        &self.board
    }

    pub fn encode_metrics(&self) -> Option<String> {
        self.metrics.encode()
    }

    pub fn update_subscriber(&self) -> broadcast::Receiver<Update> {
        self.update_tx.subscribe()
    }
}
