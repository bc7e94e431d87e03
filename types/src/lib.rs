//! Types shared by the plinko engine and its simulator.

mod account;
mod ball;
mod board;
mod constants;
mod event;

pub use account::*;
pub use ball::*;
pub use board::*;
pub use constants::*;
pub use event::*;

#[cfg(test)]
mod tests;
