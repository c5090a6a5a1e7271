//! LISTEN/NOTIFY change feed.
//!
//! Triggers installed by migration 0003 notify `tally_changes` with the
//! table name on every write to teams, events, score_log or display_settings.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tracing::warn;

pub const CHANGE_CHANNEL: &str = "tally_changes";

const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    /// Table named in the payload. Informational; consumers re-pull everything.
    pub table: String,
}

#[async_trait]
pub trait ChangeFeed: Send {
    /// Next notice, or `None` once the feed is closed for good.
    async fn next_change(&mut self) -> Option<ChangeNotice>;
}

pub struct PgChangeFeed {
    listener: PgListener,
}

impl PgChangeFeed {
    pub async fn connect(pool: &PgPool) -> Result<Self> {
        let mut listener = PgListener::connect_with(pool)
            .await
            .context("change listener connect failed")?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .with_context(|| format!("LISTEN {CHANGE_CHANNEL} failed"))?;
        Ok(Self { listener })
    }
}

#[async_trait]
impl ChangeFeed for PgChangeFeed {
    async fn next_change(&mut self) -> Option<ChangeNotice> {
        // PgListener re-connects and re-LISTENs on its own after a drop; a
        // failed recv is retried after a short pause.
        loop {
            match self.listener.recv().await {
                Ok(n) => {
                    return Some(ChangeNotice {
                        table: n.payload().to_string(),
                    })
                }
                Err(e) => {
                    warn!(error = %e, "change listener recv failed; retrying");
                    tokio::time::sleep(RECONNECT_BACKOFF).await;
                }
            }
        }
    }
}
