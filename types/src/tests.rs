use super::*;
use std::time::Duration;

fn multipliers(values: &[f64]) -> Vec<Multiplier> {
    values
        .iter()
        .map(|&v| Multiplier::from_f64(v).unwrap())
        .collect()
}

#[test]
fn test_default_board_is_valid() {
    let board = BoardConfig::default();
    let rebuilt = BoardConfig::new(
        board.rows(),
        board.bet_cost(),
        board.balls_per_drop(),
        board.multipliers().to_vec(),
        board.slot_tags().to_vec(),
        *board.timing(),
    )
    .unwrap();
    assert_eq!(board, rebuilt);
    assert_eq!(board.rows(), 16);
    assert_eq!(board.slots(), 17);
    assert_eq!(board.drop_cost(), 200);
    assert_eq!(board.multipliers()[0], Multiplier::from_bps(1_100_000));
    assert_eq!(board.multipliers()[6], Multiplier::BREAKEVEN);
    assert_eq!(board.multipliers()[8], Multiplier::from_bps(3_000));
}

#[test]
fn test_default_board_is_symmetric() {
    let board = BoardConfig::default();
    let mults = board.multipliers();
    let tags = board.slot_tags();
    for i in 0..mults.len() {
        assert_eq!(mults[i], mults[mults.len() - 1 - i]);
        assert_eq!(tags[i], tags[tags.len() - 1 - i]);
    }
}

#[test]
fn test_board_rejects_bad_rows() {
    let err = BoardConfig::new(0, 200, 1, vec![], vec![], Timing::default()).unwrap_err();
    assert_eq!(err, ConfigError::InvalidRows { rows: 0, max: MAX_ROWS });

    let err = BoardConfig::new(MAX_ROWS + 1, 200, 1, vec![], vec![], Timing::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRows { .. }));
}

#[test]
fn test_board_rejects_mismatched_tables() {
    let err = BoardConfig::new(
        2,
        200,
        1,
        multipliers(&[2.0, 0.5]),
        vec![SlotTag::Red; 3],
        Timing::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::MultiplierCount {
            rows: 2,
            expected: 3,
            got: 2
        }
    );

    let err = BoardConfig::new(
        2,
        200,
        1,
        multipliers(&[2.0, 0.5, 2.0]),
        vec![SlotTag::Red; 4],
        Timing::default(),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::SlotTagCount { expected: 3, got: 4 });
}

#[test]
fn test_board_rejects_zero_values() {
    let tags = vec![SlotTag::Yellow; 2];
    let mults = multipliers(&[2.0, 2.0]);
    assert_eq!(
        BoardConfig::new(1, 0, 1, mults.clone(), tags.clone(), Timing::default()).unwrap_err(),
        ConfigError::ZeroBetCost
    );
    assert!(matches!(
        BoardConfig::new(1, 100, 0, mults.clone(), tags.clone(), Timing::default()).unwrap_err(),
        ConfigError::InvalidBallsPerDrop { balls: 0, .. }
    ));
    let timing = Timing {
        tick_interval: Duration::ZERO,
        ..Timing::default()
    };
    assert_eq!(
        BoardConfig::new(1, 100, 1, mults, tags, timing).unwrap_err(),
        ConfigError::ZeroTickInterval
    );
}

#[test]
fn test_board_rejects_drop_cost_overflow() {
    let err = BoardConfig::new(
        1,
        u64::MAX,
        2,
        multipliers(&[2.0, 2.0]),
        vec![SlotTag::Red; 2],
        Timing::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::DropCostOverflow { .. }));
}

#[test]
fn test_board_rejects_inexact_payouts() {
    let standard = BoardConfig::default();
    // 0.05 * 0.3x would pay 0.015
    let err = BoardConfig::new(
        16,
        5,
        1,
        standard.multipliers().to_vec(),
        standard.slot_tags().to_vec(),
        Timing::default(),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::InexactPayout { slot: 5, bet_cost: 5 });

    // 0.01 * 1.5x would round a win down to the stake
    let err = BoardConfig::new(
        1,
        1,
        1,
        multipliers(&[1.5, 2.0]),
        vec![SlotTag::Red; 2],
        Timing::default(),
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::InexactPayout { slot: 0, bet_cost: 1 });

    // Any bet that is a multiple of 0.10 pays the standard table exactly
    let board = BoardConfig::new(
        16,
        10,
        1,
        standard.multipliers().to_vec(),
        standard.slot_tags().to_vec(),
        Timing::default(),
    )
    .unwrap();
    for multiplier in board.multipliers() {
        assert!(multiplier.pays_exactly(10));
        assert_eq!(
            multiplier.apply(10) as u128 * MULTIPLIER_SCALE as u128,
            10 * multiplier.bps() as u128
        );
    }
}

#[test]
fn test_multiplier_from_f64() {
    assert_eq!(Multiplier::from_f64(0.3), Some(Multiplier::from_bps(3_000)));
    assert_eq!(Multiplier::from_f64(1.5), Some(Multiplier::from_bps(15_000)));
    assert_eq!(Multiplier::from_f64(110.0), Some(Multiplier::from_bps(1_100_000)));
    assert_eq!(Multiplier::from_f64(0.0), Some(Multiplier::from_bps(0)));
    assert_eq!(Multiplier::from_f64(-1.0), None);
    assert_eq!(Multiplier::from_f64(f64::NAN), None);
    assert_eq!(Multiplier::from_f64(f64::INFINITY), None);
    assert_eq!(Multiplier::from_f64(1e12), None);
}

#[test]
fn test_multiplier_from_f64_rejects_fractional_bps() {
    // Rounding would turn this win into breakeven
    assert_eq!(Multiplier::from_f64(1.00004), None);
    assert_eq!(Multiplier::from_f64(0.00005), None);
    assert_eq!(Multiplier::from_f64(1.0001), Some(Multiplier::from_bps(10_001)));
    assert_eq!(Multiplier::from_f64(0.05), Some(Multiplier::from_bps(500)));
}

#[test]
fn test_multiplier_apply_is_exact() {
    assert_eq!(Multiplier::from_bps(3_000).apply(200), 60);
    assert_eq!(Multiplier::from_bps(1_100_000).apply(200), 22_000);
    assert_eq!(Multiplier::BREAKEVEN.apply(200), 200);
    assert_eq!(Multiplier::from_bps(0).apply(200), 0);
    assert_eq!(Multiplier::from_bps(u32::MAX).apply(u64::MAX), u64::MAX);
}

#[test]
fn test_multiplier_breakeven_is_not_a_win() {
    assert!(!Multiplier::BREAKEVEN.is_win());
    assert!(!Multiplier::from_bps(3_000).is_win());
    assert!(Multiplier::from_bps(10_001).is_win());
}

#[test]
fn test_multiplier_display() {
    assert_eq!(Multiplier::from_bps(1_100_000).to_string(), "110x");
    assert_eq!(Multiplier::from_bps(15_000).to_string(), "1.5x");
    assert_eq!(Multiplier::from_bps(3_000).to_string(), "0.3x");
    assert_eq!(Multiplier::from_bps(500).to_string(), "0.05x");
}

#[test]
fn test_path_terminal_index_and_columns() {
    use Step::*;
    let path = Path::from_steps(vec![Right, Left, Right, Right]);
    assert_eq!(path.len(), 4);
    assert_eq!(path.terminal_index(), 3);
    assert_eq!(path.column_at(0), 0);
    assert_eq!(path.column_at(1), 1);
    assert_eq!(path.column_at(2), 1);
    assert_eq!(path.column_at(10), 3);
    assert_eq!(path.step(1), Some(Left));
    assert_eq!(path.step(4), None);
}

#[test]
fn test_step_try_from() {
    assert_eq!(Step::try_from(0), Ok(Step::Left));
    assert_eq!(Step::try_from(1), Ok(Step::Right));
    assert_eq!(Step::try_from(2), Err(2));
}

#[test]
fn test_snapshot_json_shape() {
    let snapshot = Snapshot {
        account: AccountState::new(50_000),
        active_balls: 2,
        accepting_input: true,
    };
    let json = serde_json::to_value(snapshot).unwrap();
    assert_eq!(json["balance"], 50_000);
    assert_eq!(json["active_balls"], 2);
    assert_eq!(json["accepting_input"], true);
}

#[test]
fn test_event_json_tag() {
    let event = Event::BallSettled {
        ball: 3,
        slot: 8,
        multiplier: Multiplier::from_bps(3_000),
        winnings: 60,
        outcome: Outcome::Loss,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "ball_settled");
    assert_eq!(json["multiplier"], 3_000);
    assert_eq!(json["outcome"], "loss");
    assert_eq!(event.ball(), Some(3));
}

#[test]
fn test_account_net() {
    let account = AccountState {
        balance: 0,
        total_wagered: 600,
        total_won: 260,
        wins: 1,
        losses: 2,
    };
    assert_eq!(account.net(), -340);
    assert_eq!(account.settled(), 3);
}
