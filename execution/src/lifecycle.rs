//! Per-ball state machine.
//!
//! ```text
//! Spawned --start delay--> Falling(0) --tick--> ... --tick--> Falling(rows-1)
//!     --tick--> Settling --settle pause--> Done
//! ```
//!
//! The path and landing slot are fixed when the ball is created; timers only
//! stage their reveal. Every transition happens inside [BallLifecycle::on_timer],
//! which returns when the ball wants to be woken next.

use futures::channel::oneshot;
use plinko_types::{BallId, BallState, BallView, BoardConfig, DropId, Event, Path};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    ledger::Ledger,
    path,
    settlement::{settle, Settlement},
};

/// Sent to the session exactly once, when a ball reaches [BallState::Done].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub ball: BallId,
    pub drop: DropId,
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("path has {got} steps but the board has {rows} rows")]
    PathLength { got: usize, rows: u8 },
    #[error("slot {slot} is outside the {slots} slot table")]
    SlotOutOfRange { slot: u8, slots: usize },
}

pub struct BallLifecycle {
    id: BallId,
    drop: DropId,
    path: Path,
    terminal: u8,
    start_delay: Duration,
    state: BallState,
    row: u8,
    settlement: Option<Settlement>,
    completion: Option<oneshot::Sender<Completion>>,
}

impl BallLifecycle {
    /// Create a ball with a known path.
    pub fn new(
        id: BallId,
        drop: DropId,
        path: Path,
        start_delay: Duration,
        config: &BoardConfig,
        completion: oneshot::Sender<Completion>,
    ) -> Result<Self, LifecycleError> {
        if path.len() != config.rows() as usize {
            return Err(LifecycleError::PathLength {
                got: path.len(),
                rows: config.rows(),
            });
        }
        let terminal = path::replay(&path);
        if terminal as usize >= config.slots() {
            return Err(LifecycleError::SlotOutOfRange {
                slot: terminal,
                slots: config.slots(),
            });
        }

        Ok(Self {
            id,
            drop,
            path,
            terminal,
            start_delay,
            state: BallState::Spawned,
            row: 0,
            settlement: None,
            completion: Some(completion),
        })
    }

    /// Create a ball, drawing its path from `rng`.
    pub fn spawn<R: Rng + ?Sized>(
        id: BallId,
        drop: DropId,
        start_delay: Duration,
        config: &BoardConfig,
        rng: &mut R,
        completion: oneshot::Sender<Completion>,
    ) -> Result<Self, LifecycleError> {
        let (path, _) = path::generate(config.rows(), rng);
        Self::new(id, drop, path, start_delay, config, completion)
    }

    pub fn id(&self) -> BallId {
        self.id
    }

    pub fn drop_id(&self) -> DropId {
        self.drop
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn terminal(&self) -> u8 {
        self.terminal
    }

    pub fn start_delay(&self) -> Duration {
        self.start_delay
    }

    pub fn state(&self) -> BallState {
        self.state
    }

    /// Rows revealed so far.
    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    pub fn view(&self) -> BallView {
        let last_step = match self.row {
            0 => None,
            row => self.path.step(row as usize - 1),
        };
        BallView {
            id: self.id,
            drop: self.drop,
            state: self.state,
            row: self.row,
            column: self.path.column_at(self.row as usize),
            terminal: self.terminal,
            last_step,
        }
    }

    /// Handle a timer firing at `now`. Returns the next wake-up, or `None`
    /// once the ball is done.
    pub fn on_timer(
        &mut self,
        now: Duration,
        config: &BoardConfig,
        ledger: &mut Ledger,
        events: &mut Vec<Event>,
    ) -> Option<Duration> {
        let timing = config.timing();
        match self.state {
            BallState::Spawned => {
                self.state = BallState::Falling { row: 0 };
                debug!(ball = self.id, terminal = self.terminal, "ball released");
                events.push(Event::BallReleased { ball: self.id });
                Some(now + timing.tick_interval)
            }
            BallState::Falling { row } => {
                let Some(step) = self.path.step(row as usize) else {
                    error!(ball = self.id, row, "row cursor ran past the path");
                    return Some(self.settle(now, config, ledger, events));
                };
                let row = row + 1;
                self.row = row;
                events.push(Event::RowAdvanced {
                    ball: self.id,
                    row,
                    step,
                    column: self.path.column_at(row as usize),
                });
                if row == config.rows() {
                    return Some(self.settle(now, config, ledger, events));
                }
                self.state = BallState::Falling { row };
                Some(now + timing.tick_interval)
            }
            BallState::Settling => {
                self.finish(events);
                None
            }
            BallState::Done => {
                warn!(ball = self.id, "timer fired for finished ball");
                None
            }
        }
    }

    fn settle(
        &mut self,
        now: Duration,
        config: &BoardConfig,
        ledger: &mut Ledger,
        events: &mut Vec<Event>,
    ) -> Duration {
        self.state = BallState::Settling;
        match settle(self.terminal, config.bet_cost(), config.multipliers()) {
            Ok(settlement) => {
                ledger.credit(settlement.winnings);
                ledger.record_settlement(settlement.multiplier, settlement.winnings);
                debug!(
                    ball = self.id,
                    slot = settlement.slot,
                    multiplier = %settlement.multiplier,
                    winnings = settlement.winnings,
                    balance = ledger.balance(),
                    "ball settled"
                );
                events.push(Event::BallSettled {
                    ball: self.id,
                    slot: settlement.slot,
                    multiplier: settlement.multiplier,
                    winnings: settlement.winnings,
                    outcome: settlement.outcome,
                });
                self.settlement = Some(settlement);
            }
            Err(err) => {
                error!(ball = self.id, ?err, "failed to settle ball");
            }
        }
        now + config.timing().settle_pause
    }

    fn finish(&mut self, events: &mut Vec<Event>) {
        self.state = BallState::Done;
        events.push(Event::BallFinished { ball: self.id });
        let Some(completion) = self.completion.take() else {
            return;
        };
        let message = Completion {
            ball: self.id,
            drop: self.drop,
            settlement: self.settlement,
        };
        if completion.send(message).is_err() {
            debug!(ball = self.id, "completion receiver dropped");
        }
    }
}
