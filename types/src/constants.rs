use std::time::Duration;

/// Fixed-point scale of a [crate::Multiplier] (1.0x == 10_000 basis points).
pub const MULTIPLIER_SCALE: u32 = 10_000;

/// Maximum number of peg rows on a board.
pub const MAX_ROWS: u8 = 64;

/// Maximum number of balls a single drop may release.
pub const MAX_BALLS_PER_DROP: u32 = 100;

/// Rows on the standard board.
pub const DEFAULT_ROWS: u8 = 16;

/// Cost of a single ball on the standard board (2.00).
pub const DEFAULT_BET_COST: u64 = 200;

/// Balls released per drop on the standard board.
pub const DEFAULT_BALLS_PER_DROP: u32 = 1;

/// Starting balance of a new session (500.00).
pub const DEFAULT_START_BALANCE: u64 = 50_000;

/// Multipliers of the standard "high risk" board, in basis points.
///
/// High edges, low center: 110x, 41x, 10x, 5x, 3x, 1.5x, 1x, 0.5x, 0.3x, ...
pub const DEFAULT_MULTIPLIERS_BPS: [u32; 17] = [
    1_100_000, 410_000, 100_000, 50_000, 30_000, 15_000, 10_000, 5_000, 3_000, 5_000, 10_000,
    15_000, 30_000, 50_000, 100_000, 410_000, 1_100_000,
];

/// Delay between two row reveals of a falling ball.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// How long a settled ball stays in its slot before it is removed.
pub const DEFAULT_SETTLE_PAUSE: Duration = Duration::from_millis(1_000);

/// Start offset between consecutive balls of the same drop.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(100);
