//! Return-to-player analysis for a board.
//!
//! The exact figure follows from the binomial distribution of terminal
//! indices. [simulate] estimates the same thing by dropping balls without the
//! timing layer, which is how board tables get sanity checked before they are
//! shipped.

use plinko_types::{BoardConfig, Outcome, MULTIPLIER_SCALE};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::error;

use crate::{path, settlement::settle};

/// Rounds simulated per random stream.
pub const CHUNK_ROUNDS: u64 = 4_096;

/// `C(rows, k)` for every `k` in `0..=rows`.
fn binomial_row(rows: u8) -> Vec<u128> {
    let n = rows as u128;
    let mut row = Vec::with_capacity(rows as usize + 1);
    let mut current = 1u128;
    row.push(current);
    for k in 1..=n {
        current = current * (n - k + 1) / k;
        row.push(current);
    }
    row
}

/// Probability of landing in each slot.
pub fn slot_probabilities(rows: u8) -> Vec<f64> {
    let total = 2f64.powi(rows as i32);
    binomial_row(rows)
        .into_iter()
        .map(|ways| ways as f64 / total)
        .collect()
}

/// Expected payout per unit wagered.
pub fn expected_multiplier(config: &BoardConfig) -> f64 {
    let weighted: u128 = binomial_row(config.rows())
        .into_iter()
        .zip(config.multipliers())
        .map(|(ways, multiplier)| ways * multiplier.bps() as u128)
        .sum();
    let denominator = (1u128 << config.rows()) * MULTIPLIER_SCALE as u128;
    weighted as f64 / denominator as f64
}

pub fn house_edge(config: &BoardConfig) -> f64 {
    1.0 - expected_multiplier(config)
}

/// Totals of a Monte Carlo run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RtpEstimate {
    pub rounds: u64,
    pub wagered: u64,
    pub returned: u64,
    pub wins: u64,
    pub losses: u64,
    pub slot_hits: Vec<u64>,
}

impl RtpEstimate {
    pub fn empty(slots: usize) -> Self {
        Self {
            rounds: 0,
            wagered: 0,
            returned: 0,
            wins: 0,
            losses: 0,
            slot_hits: vec![0; slots],
        }
    }

    pub fn merge(mut self, other: RtpEstimate) -> Self {
        self.rounds += other.rounds;
        self.wagered = self.wagered.saturating_add(other.wagered);
        self.returned = self.returned.saturating_add(other.returned);
        self.wins += other.wins;
        self.losses += other.losses;
        for (hits, more) in self.slot_hits.iter_mut().zip(other.slot_hits) {
            *hits += more;
        }
        self
    }

    /// Observed return per unit wagered.
    pub fn rtp(&self) -> f64 {
        if self.wagered == 0 {
            return 0.0;
        }
        self.returned as f64 / self.wagered as f64
    }
}

fn simulate_chunk(config: &BoardConfig, seed: u64, chunk: u64, rounds: u64) -> RtpEstimate {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(chunk);

    let mut estimate = RtpEstimate::empty(config.slots());
    for _ in 0..rounds {
        let (_, terminal) = path::generate(config.rows(), &mut rng);
        let settlement = match settle(terminal, config.bet_cost(), config.multipliers()) {
            Ok(settlement) => settlement,
            Err(err) => {
                error!(?err, terminal, "generated path left the board");
                continue;
            }
        };
        estimate.rounds += 1;
        estimate.wagered = estimate.wagered.saturating_add(config.bet_cost());
        estimate.returned = estimate.returned.saturating_add(settlement.winnings);
        match settlement.outcome {
            Outcome::Win => estimate.wins += 1,
            Outcome::Loss => estimate.losses += 1,
        }
        estimate.slot_hits[settlement.slot as usize] += 1;
    }
    estimate
}

/// Drop `rounds` single balls of `bet_cost` each.
///
/// Rounds are split into chunks of [CHUNK_ROUNDS], each drawing from its own
/// ChaCha stream, so a seed gives the same estimate whether or not the
/// `parallel` feature is enabled.
pub fn simulate(config: &BoardConfig, rounds: u64, seed: u64) -> RtpEstimate {
    let chunks = rounds.div_ceil(CHUNK_ROUNDS);
    let run = |chunk: u64| {
        let start = chunk * CHUNK_ROUNDS;
        let size = CHUNK_ROUNDS.min(rounds - start);
        simulate_chunk(config, seed, chunk, size)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..chunks)
            .into_par_iter()
            .map(run)
            .reduce(|| RtpEstimate::empty(config.slots()), RtpEstimate::merge)
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..chunks)
            .map(run)
            .fold(RtpEstimate::empty(config.slots()), RtpEstimate::merge)
    }
}
