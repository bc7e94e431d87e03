//! Deterministic helpers for tests.

use plinko_types::{BoardConfig, Multiplier, SlotTag, Step, Timing};
use rand::{Error, RngCore};
use std::time::Duration;

/// Random source that replays a fixed sequence of steps through `Rng::gen_bool(0.5)`.
///
/// `gen_bool(0.5)` is true when the next `u64` is below `2^63`, so a `Right`
/// step is served as `0` and a `Left` step as `u64::MAX`. The script repeats
/// once exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    script: Vec<Step>,
    index: usize,
}

impl ScriptedRng {
    pub fn new(script: Vec<Step>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self { script, index: 0 }
    }

    /// Script that lands every ball of a `rows` board in `slot`.
    pub fn landing_in(slot: u8, rows: u8) -> Self {
        Self::new(steps_to(slot, rows))
    }

    /// Steps consumed so far.
    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let step = self.script[self.index % self.script.len()];
        self.index += 1;
        match step {
            Step::Right => 0,
            Step::Left => u64::MAX,
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// `slot` right steps followed by left steps, `rows` in total.
pub fn steps_to(slot: u8, rows: u8) -> Vec<Step> {
    assert!(slot <= rows, "slot {slot} is not on a {rows} row board");
    (0..rows)
        .map(|i| if i < slot { Step::Right } else { Step::Left })
        .collect()
}

/// Timing used by tests: 10ms rows, 50ms pause, 5ms stagger.
pub fn test_timing() -> Timing {
    Timing {
        tick_interval: Duration::from_millis(10),
        settle_pause: Duration::from_millis(50),
        stagger: Duration::from_millis(5),
    }
}

/// Standard multipliers with test timing and the given bet and balls per drop.
pub fn create_board(bet_cost: u64, balls_per_drop: u32) -> BoardConfig {
    let standard = BoardConfig::default();
    BoardConfig::new(
        standard.rows(),
        bet_cost,
        balls_per_drop,
        standard.multipliers().to_vec(),
        standard.slot_tags().to_vec(),
        test_timing(),
    )
    .expect("standard board is valid")
}

/// Board with arbitrary multipliers (all slots tagged yellow) and test timing.
pub fn create_custom_board(bet_cost: u64, balls_per_drop: u32, multipliers: &[f64]) -> BoardConfig {
    let rows = (multipliers.len() - 1) as u8;
    let multipliers = multipliers
        .iter()
        .map(|&m| Multiplier::from_f64(m).expect("valid multiplier"))
        .collect::<Vec<_>>();
    BoardConfig::new(
        rows,
        bet_cost,
        balls_per_drop,
        multipliers,
        vec![SlotTag::Yellow; rows as usize + 1],
        test_timing(),
    )
    .expect("custom board is valid")
}
