use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    DEFAULT_BALLS_PER_DROP, DEFAULT_BET_COST, DEFAULT_MULTIPLIERS_BPS, DEFAULT_ROWS,
    DEFAULT_SETTLE_PAUSE, DEFAULT_STAGGER, DEFAULT_TICK_INTERVAL, MAX_BALLS_PER_DROP, MAX_ROWS,
    MULTIPLIER_SCALE,
};

/// Payout multiplier of a slot, stored in basis points.
///
/// `Multiplier::from_bps(15_000)` is 1.5x. Fixed point keeps `bet * multiplier`
/// exact: [BoardConfig::new] refuses bets that some slot cannot pay in whole
/// minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multiplier(u32);

impl Multiplier {
    /// Exactly 1x: the stake comes back, which still counts as a loss.
    pub const BREAKEVEN: Self = Self(MULTIPLIER_SCALE);

    pub const fn from_bps(bps: u32) -> Self {
        Self(bps)
    }

    /// Convert a decimal multiplier (e.g. `0.3`) into basis points.
    ///
    /// Returns `None` for negative or non-finite values, values too large to
    /// represent, and values that are not a whole number of basis points.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = value * MULTIPLIER_SCALE as f64;
        let bps = scaled.round();
        if bps > u32::MAX as f64 || (scaled - bps).abs() > 1e-6 {
            return None;
        }
        Some(Self(bps as u32))
    }

    pub const fn bps(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / MULTIPLIER_SCALE as f64
    }

    /// Scale `amount` by this multiplier, rounding down to the minor unit.
    ///
    /// Exact for every bet a [BoardConfig] accepts.
    pub fn apply(self, amount: u64) -> u64 {
        let scaled = (amount as u128) * (self.0 as u128) / (MULTIPLIER_SCALE as u128);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Whether `amount * self` is a whole number of minor units.
    pub fn pays_exactly(self, amount: u64) -> bool {
        (amount as u128 * self.0 as u128) % MULTIPLIER_SCALE as u128 == 0
    }

    /// Strictly greater than 1x.
    pub const fn is_win(self) -> bool {
        self.0 > MULTIPLIER_SCALE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MULTIPLIER_SCALE;
        let frac = self.0 % MULTIPLIER_SCALE;
        if frac == 0 {
            return write!(f, "{whole}x");
        }
        let digits = format!("{frac:04}");
        write!(f, "{whole}.{}x", digits.trim_end_matches('0'))
    }
}

/// Category label of a slot, only meaningful to renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SlotTag {
    Red = 0,
    Orange = 1,
    Yellow = 2,
}

/// Cadence of a ball's presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Time between two row reveals.
    pub tick_interval: Duration,
    /// Time a settled ball rests in its slot.
    pub settle_pause: Duration,
    /// Start offset between consecutive balls of one drop.
    pub stagger: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            settle_pause: DEFAULT_SETTLE_PAUSE,
            stagger: DEFAULT_STAGGER,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rows must be in 1..={max} (got {rows})")]
    InvalidRows { rows: u8, max: u8 },
    #[error("bet cost must be > 0")]
    ZeroBetCost,
    #[error("balls per drop must be in 1..={max} (got {balls})")]
    InvalidBallsPerDrop { balls: u32, max: u32 },
    #[error("expected {expected} multipliers for {rows} rows (got {got})")]
    MultiplierCount { rows: u8, expected: usize, got: usize },
    #[error("expected {expected} slot tags (got {got})")]
    SlotTagCount { expected: usize, got: usize },
    #[error("cost of a drop overflows ({bet_cost} x {balls})")]
    DropCostOverflow { bet_cost: u64, balls: u32 },
    #[error("tick interval must be > 0")]
    ZeroTickInterval,
    #[error("slot {slot} does not pay a whole minor unit on a bet of {bet_cost}")]
    InexactPayout { slot: usize, bet_cost: u64 },
}

/// Immutable description of the board shared by every ball of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardConfig {
    rows: u8,
    bet_cost: u64,
    balls_per_drop: u32,
    multipliers: Vec<Multiplier>,
    slot_tags: Vec<SlotTag>,
    timing: Timing,
}

impl BoardConfig {
    pub fn new(
        rows: u8,
        bet_cost: u64,
        balls_per_drop: u32,
        multipliers: Vec<Multiplier>,
        slot_tags: Vec<SlotTag>,
        timing: Timing,
    ) -> Result<Self, ConfigError> {
        if rows == 0 || rows > MAX_ROWS {
            return Err(ConfigError::InvalidRows {
                rows,
                max: MAX_ROWS,
            });
        }
        if bet_cost == 0 {
            return Err(ConfigError::ZeroBetCost);
        }
        if balls_per_drop == 0 || balls_per_drop > MAX_BALLS_PER_DROP {
            return Err(ConfigError::InvalidBallsPerDrop {
                balls: balls_per_drop,
                max: MAX_BALLS_PER_DROP,
            });
        }
        let slots = rows as usize + 1;
        if multipliers.len() != slots {
            return Err(ConfigError::MultiplierCount {
                rows,
                expected: slots,
                got: multipliers.len(),
            });
        }
        if slot_tags.len() != slots {
            return Err(ConfigError::SlotTagCount {
                expected: slots,
                got: slot_tags.len(),
            });
        }
        if bet_cost.checked_mul(balls_per_drop as u64).is_none() {
            return Err(ConfigError::DropCostOverflow {
                bet_cost,
                balls: balls_per_drop,
            });
        }
        if timing.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        if let Some(slot) = multipliers
            .iter()
            .position(|m| !m.pays_exactly(bet_cost))
        {
            return Err(ConfigError::InexactPayout { slot, bet_cost });
        }

        Ok(Self {
            rows,
            bet_cost,
            balls_per_drop,
            multipliers,
            slot_tags,
            timing,
        })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn slots(&self) -> usize {
        self.multipliers.len()
    }

    pub fn bet_cost(&self) -> u64 {
        self.bet_cost
    }

    pub fn balls_per_drop(&self) -> u32 {
        self.balls_per_drop
    }

    /// Cost of one drop (`bet_cost * balls_per_drop`), checked at construction.
    pub fn drop_cost(&self) -> u64 {
        self.bet_cost.saturating_mul(self.balls_per_drop as u64)
    }

    pub fn multipliers(&self) -> &[Multiplier] {
        &self.multipliers
    }

    pub fn slot_tags(&self) -> &[SlotTag] {
        &self.slot_tags
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }
}

/// Tags of the standard board: red edges, orange shoulders, yellow center.
pub fn default_slot_tags() -> Vec<SlotTag> {
    use SlotTag::*;
    vec![
        Red, Red, Red, Orange, Orange, Orange, Yellow, Yellow, Yellow, Yellow, Yellow, Orange,
        Orange, Orange, Red, Red, Red,
    ]
}

impl Default for BoardConfig {
    /// The 16-row high risk board.
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            bet_cost: DEFAULT_BET_COST,
            balls_per_drop: DEFAULT_BALLS_PER_DROP,
            multipliers: DEFAULT_MULTIPLIERS_BPS
                .iter()
                .map(|&bps| Multiplier::from_bps(bps))
                .collect(),
            slot_tags: default_slot_tags(),
            timing: Timing::default(),
        }
    }
}
