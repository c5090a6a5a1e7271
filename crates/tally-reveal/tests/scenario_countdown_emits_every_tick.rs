use tally_reveal::*;
use tally_schemas::Team;

fn board_with(teams: Vec<Team>) -> Scoreboard {
    let mut b = Scoreboard::default();
    b.apply_snapshot(StandingsSnapshot {
        teams,
        ..StandingsSnapshot::default()
    });
    b
}

fn ticks(events: &[RevealEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            RevealEvent::CountdownTick { remaining } => Some(*remaining),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_one_second_steps_emit_ten_down_to_zero_then_winner() {
    let mut b = board_with(vec![Team::new(1, "Red", Some(170))]);

    let mut seen = ticks(&b.start_countdown(5_000).unwrap());
    let mut all = Vec::new();
    for s in 1..=10u64 {
        // Half a second early: nothing yet.
        assert!(ticks(&b.advance(5_000 + s * 1_000 - 500)).is_empty());
        let evs = b.advance(5_000 + s * 1_000);
        seen.extend(ticks(&evs));
        all.extend(evs);
    }

    assert_eq!(seen, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
    assert!(matches!(b.reveal().phase(), RevealPhase::Winner { .. }));

    let zero_at = all
        .iter()
        .position(|e| *e == RevealEvent::CountdownTick { remaining: 0 })
        .unwrap();
    assert!(matches!(
        all[zero_at + 1],
        RevealEvent::WinnerRevealed { .. }
    ));
}

#[test]
fn scenario_one_late_advance_still_emits_every_tick_once() {
    let mut b = board_with(vec![Team::new(1, "Red", Some(170))]);

    let mut seen = ticks(&b.start_countdown(0).unwrap());
    seen.extend(ticks(&b.advance(4_200)));
    assert_eq!(seen, vec![10, 9, 8, 7, 6]);

    seen.extend(ticks(&b.advance(60_000)));
    assert_eq!(seen, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);

    // Nothing left to fire for the countdown.
    assert!(ticks(&b.advance(120_000)).is_empty());
    assert!(!b.reveal().timer_active(TimerKind::Countdown));
}

#[test]
fn scenario_countdown_only_starts_from_idle() {
    let mut b = board_with(vec![Team::new(1, "Red", Some(170))]);
    b.start_countdown(0).unwrap();

    assert_eq!(
        b.start_countdown(10),
        Err(RevealError::NotIdle { phase: "countdown" })
    );

    b.advance(10_000);
    assert_eq!(
        b.start_countdown(10_001),
        Err(RevealError::NotIdle { phase: "winner" })
    );
}

#[test]
fn scenario_winner_is_recomputed_when_countdown_expires() {
    let mut b = board_with(vec![
        Team::new(1, "Red", Some(200)),
        Team::new(2, "Blue", Some(180)),
    ]);
    b.start_countdown(0).unwrap();
    b.advance(5_000);

    // Standings change mid-countdown (poll or push refresh).
    b.apply_snapshot(StandingsSnapshot {
        teams: vec![
            Team::new(1, "Red", Some(200)),
            Team::new(2, "Blue", Some(240)),
        ],
        ..StandingsSnapshot::default()
    });
    b.advance(10_000);

    match b.reveal().phase() {
        RevealPhase::Winner { winner: Some(card) } => {
            assert_eq!(card.team_name, "Blue");
            assert_eq!(card.target, 240);
        }
        other => panic!("expected winner, got {other:?}"),
    }
}

#[test]
fn scenario_empty_board_reveals_no_winner() {
    let mut b = board_with(vec![]);
    b.start_countdown(0).unwrap();
    let evs = b.advance(10_000);

    assert!(evs.contains(&RevealEvent::WinnerRevealed { winner: None }));
    assert!(!evs.contains(&RevealEvent::ConfettiStarted));
    assert!(!b.reveal().confetti_active());
}
