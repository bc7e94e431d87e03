//! Slot payout calculation.

use plinko_types::{Multiplier, Outcome};

/// Payout of one ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub slot: u8,
    pub multiplier: Multiplier,
    /// `bet * multiplier`, the full amount returned to the player.
    pub winnings: u64,
    pub outcome: Outcome,
}

/// Error during settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// Slot is not covered by the multiplier table.
    IndexOutOfRange { index: u8, slots: usize },
}

/// Classify a multiplier. Breakeven (exactly 1x) is a loss.
pub fn classify(multiplier: Multiplier) -> Outcome {
    if multiplier.is_win() {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

/// Settle a ball that landed in `terminal`.
pub fn settle(
    terminal: u8,
    bet: u64,
    multipliers: &[Multiplier],
) -> Result<Settlement, SettlementError> {
    let multiplier = *multipliers
        .get(terminal as usize)
        .ok_or(SettlementError::IndexOutOfRange {
            index: terminal,
            slots: multipliers.len(),
        })?;
    Ok(Settlement {
        slot: terminal,
        multiplier,
        winnings: multiplier.apply(bet),
        outcome: classify(multiplier),
    })
}
