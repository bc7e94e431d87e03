//! Drop session: accepts play requests and owns everything that changes while
//! balls are in flight.
//!
//! A session is a single-threaded cooperative system. Balls never run on their
//! own; [Session::advance_to] moves the virtual clock and fires whatever timers
//! became due, in deadline order. Callers that share a session across threads
//! wrap it in a lock, which makes each [Session::request_drop] one indivisible
//! check, debit and spawn.

use futures::channel::oneshot;
use plinko_types::{AccountState, BallId, BallView, BoardConfig, DropId, Event, Snapshot};
use rand::Rng;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::{
    ledger::Ledger,
    lifecycle::{BallLifecycle, Completion, LifecycleError},
    scheduler::Scheduler,
};

pub struct Session<R: Rng> {
    config: Arc<BoardConfig>,
    ledger: Ledger,
    rng: R,
    scheduler: Scheduler,
    balls: BTreeMap<BallId, BallLifecycle>,
    completions: Vec<oneshot::Receiver<Completion>>,
    active_balls: u32,
    next_ball: BallId,
    next_drop: DropId,
    events: Vec<Event>,
}

impl<R: Rng> Session<R> {
    pub fn new(config: Arc<BoardConfig>, start_balance: u64, rng: R) -> Self {
        Self {
            config,
            ledger: Ledger::new(start_balance),
            rng,
            scheduler: Scheduler::new(),
            balls: BTreeMap::new(),
            completions: Vec::new(),
            active_balls: 0,
            next_ball: 0,
            next_drop: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &Arc<BoardConfig> {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn account(&self) -> &AccountState {
        self.ledger.state()
    }

    pub fn active_balls(&self) -> u32 {
        self.active_balls
    }

    /// Whether the balance covers at least one ball. In-flight balls do not matter.
    pub fn accepting_input(&self) -> bool {
        self.ledger.balance() >= self.config.bet_cost()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            account: *self.ledger.state(),
            active_balls: self.active_balls,
            accepting_input: self.accepting_input(),
        }
    }

    /// Render views of the balls still in flight, oldest first.
    pub fn balls(&self) -> impl Iterator<Item = BallView> + '_ {
        self.balls.values().map(BallLifecycle::view)
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Pay for and release one drop. Returns `false`, changing nothing but the
    /// event log, when the balance does not cover it.
    ///
    /// Every ball of the drop is built before the ledger is touched, so a drop
    /// is either paid for and fully in flight or not paid for at all.
    pub fn request_drop(&mut self) -> bool {
        let cost = self.config.drop_cost();
        let balance = self.ledger.balance();
        if balance < cost {
            debug!(cost, balance, "drop rejected");
            self.events.push(Event::DropRejected { cost, balance });
            return false;
        }

        let drop = self.next_drop;
        let balls = match self.build_balls(drop) {
            Ok(balls) => balls,
            Err(err) => {
                // Paths are drawn from the validated board, so this is a bug
                error!(drop, %err, "failed to spawn drop");
                return false;
            }
        };
        if !self.ledger.place_wager(cost) {
            error!(drop, cost, "wager failed after funds check");
            return false;
        }

        self.next_drop += 1;
        self.next_ball += balls.len() as BallId;
        let count = self.config.balls_per_drop();
        self.events.push(Event::DropAccepted {
            drop,
            balls: count,
            cost,
        });
        debug!(drop, balls = count, cost, balance = self.ledger.balance(), "drop accepted");

        for (ball, receiver, start) in balls {
            let id = ball.id();
            self.events.push(Event::BallSpawned {
                ball: id,
                drop,
                terminal: ball.terminal(),
            });
            self.active_balls += 1;
            self.balls.insert(id, ball);
            self.completions.push(receiver);
            self.scheduler.schedule(start, id);
        }
        true
    }

    /// Draw the paths of every ball of `drop`, with their completion receivers
    /// and start times. Ball `i` starts `stagger * i` from now.
    #[allow(clippy::type_complexity)]
    fn build_balls(
        &mut self,
        drop: DropId,
    ) -> Result<Vec<(BallLifecycle, oneshot::Receiver<Completion>, Duration)>, LifecycleError> {
        let now = self.scheduler.now();
        let stagger = self.config.timing().stagger;
        (0..self.config.balls_per_drop())
            .map(|index| {
                let (sender, receiver) = oneshot::channel();
                let start_delay = stagger * index;
                let ball = BallLifecycle::spawn(
                    self.next_ball + index as BallId,
                    drop,
                    start_delay,
                    &self.config,
                    &mut self.rng,
                    sender,
                )?;
                Ok((ball, receiver, now + start_delay))
            })
            .collect()
    }

    /// Move the clock to `now`, firing every timer due by then in deadline order.
    /// Returns the number of timers fired.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some((deadline, id)) = self.scheduler.pop_due(now) {
            self.scheduler.set_now(deadline);
            fired += 1;
            let Some(ball) = self.balls.get_mut(&id) else {
                warn!(ball = id, "timer fired for unknown ball");
                continue;
            };
            let next = ball.on_timer(deadline, &self.config, &mut self.ledger, &mut self.events);
            if let Some(next) = next {
                self.scheduler.schedule(next, id);
            }
        }
        self.scheduler.set_now(now);
        self.collect_completions();
        fired
    }

    /// Move the clock forward by `delta`.
    pub fn advance_by(&mut self, delta: Duration) -> usize {
        let now = self.scheduler.now() + delta;
        self.advance_to(now)
    }

    /// Jump from deadline to deadline until no ball is in flight.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.scheduler.next_deadline() {
            fired += self.advance_to(deadline);
        }
        fired
    }

    fn collect_completions(&mut self) {
        let mut finished = Vec::new();
        let mut canceled = 0u32;
        self.completions.retain_mut(|receiver| match receiver.try_recv() {
            Ok(Some(completion)) => {
                finished.push(completion);
                false
            }
            Ok(None) => true,
            Err(_) => {
                canceled += 1;
                false
            }
        });

        for completion in finished {
            self.balls.remove(&completion.ball);
            self.active_balls = self.active_balls.saturating_sub(1);
            debug!(
                ball = completion.ball,
                drop = completion.drop,
                active = self.active_balls,
                "ball finished"
            );
        }
        if canceled > 0 {
            warn!(canceled, "balls dropped without completing");
            self.active_balls = self.active_balls.saturating_sub(canceled);
        }
    }
}
