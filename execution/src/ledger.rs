//! Player balance and statistics.
//!
//! The ledger is the only writer of [AccountState]. Every mutation takes
//! `&mut self`, so callers holding the session serialize them for free.

use plinko_types::{AccountState, Multiplier, Outcome};
use tracing::debug;

use crate::settlement::classify;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    state: AccountState,
}

impl Ledger {
    pub fn new(balance: u64) -> Self {
        Self {
            state: AccountState::new(balance),
        }
    }

    pub fn state(&self) -> &AccountState {
        &self.state
    }

    pub fn balance(&self) -> u64 {
        self.state.balance
    }

    /// Remove `amount` from the balance. Fails without any change if the
    /// balance does not cover it.
    pub fn debit(&mut self, amount: u64) -> bool {
        match self.state.balance.checked_sub(amount) {
            Some(balance) => {
                self.state.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Add `amount` to the balance.
    pub fn credit(&mut self, amount: u64) {
        self.state.balance = self.state.balance.saturating_add(amount);
    }

    pub fn record_wager(&mut self, amount: u64) {
        self.state.total_wagered = self.state.total_wagered.saturating_add(amount);
    }

    /// Count a settled ball: its winnings and whether it was a win.
    pub fn record_settlement(&mut self, multiplier: Multiplier, winnings: u64) {
        self.state.total_won = self.state.total_won.saturating_add(winnings);
        match classify(multiplier) {
            Outcome::Win => self.state.wins += 1,
            Outcome::Loss => self.state.losses += 1,
        }
    }

    /// Debit a wager and count it as wagered in one step.
    pub fn place_wager(&mut self, amount: u64) -> bool {
        if !self.debit(amount) {
            debug!(
                amount,
                balance = self.state.balance,
                "insufficient balance for wager"
            );
            return false;
        }
        self.record_wager(amount);
        true
    }
}
