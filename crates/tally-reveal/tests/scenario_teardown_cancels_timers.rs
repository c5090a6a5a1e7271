use tally_reveal::*;
use tally_schemas::Team;

#[test]
fn scenario_teardown_mid_countdown_stops_all_firing() {
    let mut b = Scoreboard::default();
    b.apply_snapshot(StandingsSnapshot {
        teams: vec![Team::new(1, "Red", Some(170))],
        ..StandingsSnapshot::default()
    });
    b.start_countdown(0).unwrap();
    b.advance(3_000);

    b.teardown();

    assert!(b.advance(60_000).is_empty());
    assert_eq!(b.reveal().phase(), &RevealPhase::Countdown { remaining: 7 });
    for kind in [TimerKind::Countdown, TimerKind::CountUp, TimerKind::Confetti] {
        assert!(!b.reveal().timer_active(kind));
    }
}

#[test]
fn scenario_teardown_during_winner_cancels_countup_and_confetti() {
    let mut b = Scoreboard::default();
    b.apply_snapshot(StandingsSnapshot {
        teams: vec![Team::new(1, "Red", Some(5_000))],
        ..StandingsSnapshot::default()
    });
    b.start_countdown(0).unwrap();
    b.advance(10_000);
    assert!(b.reveal().timer_active(TimerKind::CountUp));

    b.teardown();
    assert!(b.advance(30_000).is_empty());
    assert!(!b.reveal().confetti_active());
}

#[test]
fn scenario_commands_after_teardown_are_refused() {
    let mut b = Scoreboard::default();
    b.teardown();

    assert_eq!(b.start_countdown(0), Err(RevealError::Disposed));
    assert_eq!(b.dismiss_winner(), Err(RevealError::Disposed));
    assert_eq!(b.reset_toggles(true), Err(RevealError::Disposed));
    assert_eq!(
        b.set_masks(&MaskPatch::default()),
        Err(RevealError::Disposed)
    );
}

#[test]
fn scenario_boards_are_independent() {
    let mut a = Scoreboard::default();
    let mut b = Scoreboard::default();

    a.start_countdown(0).unwrap();
    b.reset_toggles(true).unwrap();
    a.advance(2_000);

    assert_eq!(a.reveal().phase(), &RevealPhase::Countdown { remaining: 8 });
    assert_eq!(b.reveal().phase(), &RevealPhase::Idle);
    assert!(!a.reveal().masks().hide_names);
    assert!(b.reveal().masks().hide_names);
}
