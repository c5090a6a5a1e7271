use tally_reconcile::*;
use tally_schemas::{ScoreLogEntry, Team};

#[test]
fn scenario_example_a_penalty_and_unexplained_points_net_into_residual() {
    let team = Team::new(1, "A", Some(170));
    let logs = vec![
        ScoreLogEntry::new("A", "Quiz Bee", 15),
        ScoreLogEntry::new("A", "Late Penalty", -5),
    ];
    let catalog = EventCatalog::from_names(["Quiz Bee"]);

    let b = breakdown(&team, &logs, &catalog, BASE_POINTS);
    assert_eq!(b.per_event["Quiz Bee"], 15);
    assert_eq!(b.residual, 5);
    assert_eq!(b.total, 170);
}

#[test]
fn scenario_example_b_no_score_no_logs() {
    let team = Team::new(2, "B", None);
    let catalog = EventCatalog::from_names(["Quiz Bee", "Relay"]);

    let b = breakdown(&team, &[], &catalog, BASE_POINTS);
    assert_eq!(b.total, 150);
    assert_eq!(b.residual, 0);
    assert_eq!(b.per_event["Quiz Bee"], 0);
    assert_eq!(b.per_event["Relay"], 0);
}
