use serde::{Deserialize, Serialize};

/// Balance and running statistics of a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: u64,
    pub total_wagered: u64,
    pub total_won: u64,
    pub wins: u64,
    pub losses: u64,
}

impl AccountState {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Balls that have been settled so far.
    pub fn settled(&self) -> u64 {
        self.wins + self.losses
    }

    /// Won minus wagered, in minor units.
    pub fn net(&self) -> i128 {
        self.total_won as i128 - self.total_wagered as i128
    }
}

/// Read-only view of a session, published after every mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub account: AccountState,
    pub active_balls: u32,
    pub accepting_input: bool,
}
