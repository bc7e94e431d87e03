use crate::{
    ledger::Ledger,
    lifecycle::BallLifecycle,
    mocks::{create_board, create_custom_board, steps_to, ScriptedRng},
    rtp,
    scheduler::Scheduler,
    Session,
};
use futures::{channel::oneshot, executor::block_on};
use plinko_types::{BallState, BoardConfig, Event, Outcome, Path};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::BTreeMap, sync::Arc, time::Duration};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn test_random_play_conserves_money() {
    let config = Arc::new(create_board(200, 3));
    let start = 50_000;
    let mut session = Session::new(config.clone(), start, StdRng::seed_from_u64(11));
    let mut driver = StdRng::seed_from_u64(12);

    let mut accepted = 0u64;
    for _ in 0..200 {
        if driver.gen_bool(0.3) && session.request_drop() {
            accepted += 1;
        }
        session.advance_by(ms(driver.gen_range(0..40)));

        // Holds at every point, not just when idle
        let account = *session.account();
        assert_eq!(
            account.balance as i128,
            start as i128 - account.total_wagered as i128 + account.total_won as i128
        );
    }
    session.run_until_idle();

    let account = session.account();
    assert_eq!(account.total_wagered, accepted * config.drop_cost());
    assert_eq!(
        account.wins + account.losses,
        accepted * config.balls_per_drop() as u64
    );
    assert_eq!(session.active_balls(), 0);
    assert_eq!(session.balls().count(), 0);
}

#[test]
fn test_event_stream_per_ball() {
    let config = Arc::new(create_board(200, 4));
    let mut session = Session::new(config.clone(), 10_000, StdRng::seed_from_u64(5));
    assert!(session.request_drop());
    session.advance_by(ms(3));
    assert!(session.request_drop());
    session.run_until_idle();

    let mut per_ball: BTreeMap<u64, Vec<Event>> = BTreeMap::new();
    for event in session.drain_events() {
        if let Some(ball) = event.ball() {
            per_ball.entry(ball).or_default().push(event);
        }
    }
    assert_eq!(per_ball.len(), 8);

    let rows = config.rows() as usize;
    for (ball, events) in per_ball {
        // spawned, released, one per row, settled, finished
        assert_eq!(events.len(), rows + 4, "ball {ball}");
        let Event::BallSpawned { terminal, .. } = events[0] else {
            panic!("ball {ball} did not start with a spawn: {:?}", events[0]);
        };
        assert_eq!(events[1], Event::BallReleased { ball });

        let mut column = 0;
        for (index, event) in events[2..2 + rows].iter().enumerate() {
            let Event::RowAdvanced {
                row,
                step,
                column: at,
                ..
            } = *event
            else {
                panic!("expected row advance, got {event:?}");
            };
            assert_eq!(row as usize, index + 1);
            column += step.offset();
            assert_eq!(at, column);
        }
        assert_eq!(column, terminal);

        match events[rows + 2] {
            Event::BallSettled { slot, winnings, .. } => {
                assert_eq!(slot, terminal);
                assert_eq!(winnings, config.multipliers()[slot as usize].apply(200));
            }
            ref other => panic!("expected settlement, got {other:?}"),
        }
        assert_eq!(events[rows + 3], Event::BallFinished { ball });
    }
}

#[test]
fn test_completion_received_once() {
    let config = create_board(200, 1);
    let mut ledger = Ledger::new(0);
    let mut events = Vec::new();
    let mut scheduler = Scheduler::new();
    let (sender, receiver) = oneshot::channel();

    let path = Path::from_steps(steps_to(0, 16));
    let mut ball = BallLifecycle::new(7, 2, path, ms(0), &config, sender).unwrap();
    scheduler.schedule(ms(0), ball.id());
    while let Some((deadline, _)) = scheduler.pop_due(Duration::MAX) {
        if let Some(next) = ball.on_timer(deadline, &config, &mut ledger, &mut events) {
            scheduler.schedule(next, ball.id());
        }
    }
    assert_eq!(ball.state(), BallState::Done);

    let completion = block_on(receiver).unwrap();
    assert_eq!(completion.ball, 7);
    assert_eq!(completion.drop, 2);
    let settlement = completion.settlement.unwrap();
    assert_eq!(settlement.slot, 0);
    assert_eq!(settlement.winnings, 22_000);
    assert_eq!(settlement.outcome, Outcome::Win);
    assert_eq!(ledger.balance(), 22_000);

    // A stray timer afterwards neither pays nor notifies again
    assert_eq!(ball.on_timer(ms(10_000), &config, &mut ledger, &mut events), None);
    assert_eq!(ledger.balance(), 22_000);
    assert_eq!(ledger.state().wins, 1);
}

#[test]
fn test_rapid_requests_while_falling() {
    // Nothing pays back, so funds only ever shrink
    let config = Arc::new(create_custom_board(100, 2, &[0.0; 9]));
    let mut session = Session::new(config, 1_050, ScriptedRng::landing_in(4, 8));

    let mut accepted = 0;
    for _ in 0..20 {
        if session.request_drop() {
            accepted += 1;
        }
        session.advance_by(ms(7));
    }
    assert_eq!(accepted, 5);
    assert_eq!(session.account().balance, 50);
    assert!(!session.accepting_input());

    session.run_until_idle();
    let account = session.account();
    assert_eq!(account.losses, 10);
    assert_eq!(account.total_won, 0);
    assert_eq!(account.balance, 50);
}

#[test]
fn test_landing_frequencies_follow_binomial() {
    let config = Arc::new(BoardConfig::default());
    let drops = 2_000u64;
    let mut session = Session::new(config.clone(), u64::MAX / 2, StdRng::seed_from_u64(9));
    for _ in 0..drops {
        assert!(session.request_drop());
    }
    session.run_until_idle();

    let mut hits = vec![0u64; config.slots()];
    for event in session.drain_events() {
        if let Event::BallSettled { slot, .. } = event {
            hits[slot as usize] += 1;
        }
    }
    assert_eq!(hits.iter().sum::<u64>(), drops);

    // Largest standard deviation of a slot frequency is about 0.009
    let probabilities = rtp::slot_probabilities(config.rows());
    for (slot, (hits, probability)) in hits.iter().zip(&probabilities).enumerate() {
        let observed = *hits as f64 / drops as f64;
        assert!(
            (observed - probability).abs() < 0.04,
            "slot {slot}: observed {observed}, expected {probability}"
        );
    }
}
