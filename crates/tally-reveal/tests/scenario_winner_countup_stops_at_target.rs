use tally_reveal::*;
use tally_schemas::Team;

fn reveal_winner(score: Option<i64>) -> (Scoreboard, Vec<RevealEvent>) {
    let mut b = Scoreboard::default();
    b.apply_snapshot(StandingsSnapshot {
        teams: vec![Team::new(1, "Red", score)],
        ..StandingsSnapshot::default()
    });
    b.start_countdown(0).unwrap();
    let evs = b.advance(10_000);
    (b, evs)
}

fn countups(events: &[RevealEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            RevealEvent::CountUp { displayed, .. } => Some(*displayed),
            _ => None,
        })
        .collect()
}

fn displayed(b: &Scoreboard) -> i64 {
    match b.reveal().phase() {
        RevealPhase::Winner { winner: Some(card) } => card.displayed,
        other => panic!("expected winner, got {other:?}"),
    }
}

#[test]
fn scenario_countup_reaches_target_exactly_and_stops() {
    for target in [1i64, 79, 80, 81, 150, 170, 999, 12_345] {
        let (mut b, _) = reveal_winner(Some(target));
        assert_eq!(displayed(&b), 0);

        let mut values = Vec::new();
        let mut now = 10_000;
        while b.reveal().timer_active(TimerKind::CountUp) {
            now += 20;
            values.extend(countups(&b.advance(now)));
            assert!(values.len() <= 80, "count-up ran past 80 steps");
        }

        assert_eq!(values.last().copied(), Some(target));
        assert!(values.iter().all(|v| *v <= target), "overshoot for {target}");
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(displayed(&b), target);
    }
}

#[test]
fn scenario_step_is_ceil_of_target_over_eighty() {
    let (mut b, _) = reveal_winner(Some(170));
    let first = countups(&b.advance(10_020));
    assert_eq!(first, vec![3]);
    let next = countups(&b.advance(10_040));
    assert_eq!(next, vec![6]);
}

#[test]
fn scenario_zero_target_shows_zero_immediately() {
    let (b, evs) = reveal_winner(Some(0));

    assert_eq!(displayed(&b), 0);
    assert!(!b.reveal().timer_active(TimerKind::CountUp));
    assert!(countups(&evs).is_empty());
}

#[test]
fn scenario_negative_target_is_shown_without_counting() {
    let (b, _) = reveal_winner(Some(-25));
    assert_eq!(displayed(&b), -25);
    assert!(!b.reveal().timer_active(TimerKind::CountUp));
}

#[test]
fn scenario_missing_score_counts_up_to_base_points() {
    let (mut b, _) = reveal_winner(None);
    b.advance(20_000);
    assert_eq!(displayed(&b), 150);
}

#[test]
fn scenario_confetti_ends_after_six_seconds() {
    let (mut b, evs) = reveal_winner(Some(170));
    assert!(evs.contains(&RevealEvent::ConfettiStarted));
    assert!(b.reveal().confetti_active());

    assert!(!b.advance(15_999).contains(&RevealEvent::ConfettiEnded));
    assert!(b.reveal().confetti_active());

    assert!(b.advance(16_000).contains(&RevealEvent::ConfettiEnded));
    assert!(!b.reveal().confetti_active());
    assert!(b.view().phase.name() == "winner");
}
