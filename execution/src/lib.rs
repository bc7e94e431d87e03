pub mod ledger;
pub mod lifecycle;
pub mod path;
pub mod rtp;
pub mod scheduler;
pub mod session;
pub mod settlement;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod integration_tests;

pub use ledger::Ledger;
pub use lifecycle::{BallLifecycle, Completion, LifecycleError};
pub use rtp::{expected_multiplier, house_edge, simulate, RtpEstimate};
pub use session::Session;
pub use settlement::{settle, Settlement, SettlementError};
