use anyhow::{Context, Result};
use std::fs;
use tally_config::BoardSettings;
use tally_db::{PgStore, ScoreStore};
use tally_reveal::{RevealTiming, Scoreboard, StandingsSnapshot};

pub async fn run(config_paths: &[String], snapshot: Option<&str>, json: bool) -> Result<()> {
    let loaded = super::load_config(config_paths)?;
    super::check_unused_keys(&loaded, false)?;
    let settings = BoardSettings::from_config_json(&loaded.config_json)?;

    let snap = match snapshot {
        Some(path) => read_snapshot(path)?,
        None => {
            let pool = super::connect_configured(config_paths).await?;
            fetch_snapshot(&PgStore::new(pool)).await?
        }
    };

    let mut board = Scoreboard::new(settings.base_points, RevealTiming::default());
    board.apply_snapshot(snap);
    let tally = board.tally();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tally).context("serialize tally")?
        );
        return Ok(());
    }

    let mut header = vec![
        "rank".to_string(),
        "team".to_string(),
        "total".to_string(),
        "base".to_string(),
    ];
    header.extend(tally.events.iter().cloned());
    header.push("residual".to_string());
    println!("{}", header.join("\t"));

    for row in &tally.rows {
        let b = &row.breakdown;
        let mut cols = vec![
            row.rank.to_string(),
            b.team_name.clone(),
            b.total.to_string(),
            b.base_points.to_string(),
        ];
        cols.extend(
            tally
                .events
                .iter()
                .map(|e| b.per_event.get(e).copied().unwrap_or(0).to_string()),
        );
        cols.push(b.residual.to_string());
        println!("{}", cols.join("\t"));
    }
    Ok(())
}

fn read_snapshot(path: &str) -> Result<StandingsSnapshot> {
    let s = fs::read_to_string(path).with_context(|| format!("read snapshot: {path}"))?;
    serde_json::from_str(&s).context("parse snapshot json")
}

/// Unlike the daemon, the CLI surfaces store errors instead of degrading.
async fn fetch_snapshot(store: &dyn ScoreStore) -> Result<StandingsSnapshot> {
    Ok(StandingsSnapshot {
        teams: store.fetch_teams().await?,
        events: store.fetch_events().await?,
        logs: store.fetch_score_log().await?,
    })
}
