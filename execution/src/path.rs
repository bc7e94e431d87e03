//! Path generation.
//!
//! A path is drawn in full when a ball is spawned: one fair left/right choice
//! per row. The landing slot is the number of right steps, so it is always in
//! `[0, rows]` and always a valid index into the multiplier table.

use plinko_types::{Path, Step};
use rand::Rng;

/// Draw a single fair step.
pub fn draw_step<R: Rng + ?Sized>(rng: &mut R) -> Step {
    if rng.gen_bool(0.5) {
        Step::Right
    } else {
        Step::Left
    }
}

/// Generate a path of `rows` steps and the slot it lands in.
pub fn generate<R: Rng + ?Sized>(rows: u8, rng: &mut R) -> (Path, u8) {
    let mut steps = Vec::with_capacity(rows as usize);
    let mut terminal = 0u8;
    for _ in 0..rows {
        let step = draw_step(rng);
        terminal += step.offset();
        steps.push(step);
    }
    (Path::from_steps(steps), terminal)
}

/// Recompute the landing slot of an existing path.
pub fn replay(path: &Path) -> u8 {
    path.steps().iter().fold(0u8, |slot, step| slot + step.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedRng;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_generate_length_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for rows in 1..=64u8 {
            for _ in 0..20 {
                let (path, terminal) = generate(rows, &mut rng);
                assert_eq!(path.len(), rows as usize);
                assert!(terminal <= rows);
            }
        }
    }

    #[test]
    fn test_terminal_is_step_sum() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let (path, terminal) = generate(16, &mut rng);
            let rights = path.steps().iter().filter(|s| **s == Step::Right).count();
            assert_eq!(terminal as usize, rights);
            assert_eq!(replay(&path), terminal);
            assert_eq!(path.terminal_index(), terminal);
        }
    }

    #[test]
    fn test_generate_is_deterministic_for_seed() {
        let mut a = StdRng::seed_from_u64(1234);
        let mut b = StdRng::seed_from_u64(1234);
        for _ in 0..50 {
            assert_eq!(generate(16, &mut a), generate(16, &mut b));
        }
    }

    #[test]
    fn test_scripted_source() {
        use Step::*;
        let mut rng = ScriptedRng::new(vec![Right, Right, Left, Right]);
        let (path, terminal) = generate(4, &mut rng);
        assert_eq!(path.steps(), &[Right, Right, Left, Right]);
        assert_eq!(terminal, 3);
    }

    #[test]
    fn test_steps_are_roughly_fair() {
        let mut rng = StdRng::seed_from_u64(99);
        let draws = 20_000;
        let rights = (0..draws)
            .filter(|_| draw_step(&mut rng) == Step::Right)
            .count();
        // 20k fair draws land within a few percent of half
        assert!(rights > 9_400 && rights < 10_600, "rights = {rights}");
    }
}
