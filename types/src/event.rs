use serde::{Deserialize, Serialize};

use super::{BallId, DropId, Multiplier, Outcome, Step};

/// Something observable that happened inside a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    DropAccepted {
        drop: DropId,
        balls: u32,
        cost: u64,
    },
    DropRejected {
        cost: u64,
        balance: u64,
    },
    BallSpawned {
        ball: BallId,
        drop: DropId,
        terminal: u8,
    },
    BallReleased {
        ball: BallId,
    },
    RowAdvanced {
        ball: BallId,
        /// Rows revealed after this advance (1..=rows).
        row: u8,
        step: Step,
        column: u8,
    },
    BallSettled {
        ball: BallId,
        slot: u8,
        multiplier: Multiplier,
        winnings: u64,
        outcome: Outcome,
    },
    BallFinished {
        ball: BallId,
    },
}

impl Event {
    /// Ball the event refers to, if any.
    pub fn ball(&self) -> Option<BallId> {
        match self {
            Event::DropAccepted { .. } | Event::DropRejected { .. } => None,
            Event::BallSpawned { ball, .. }
            | Event::BallReleased { ball }
            | Event::RowAdvanced { ball, .. }
            | Event::BallSettled { ball, .. }
            | Event::BallFinished { ball } => Some(*ball),
        }
    }
}
