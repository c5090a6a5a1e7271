use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tally_schemas::{DisplaySettings, EventCategory, NewStudent, ScoreLogEntry, Student, Team};

use crate::changes::{ChangeFeed, PgChangeFeed};

/// A stored student together with the credential needed to check a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentCredentials {
    pub student: Student,
    pub password_salt: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(Student),
    /// `student_id` already taken; nothing was written.
    Duplicate,
}

/// Everything the daemon reads from, or writes to, the system of record.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn fetch_teams(&self) -> Result<Vec<Team>>;
    async fn fetch_events(&self) -> Result<Vec<EventCategory>>;
    async fn fetch_score_log(&self) -> Result<Vec<ScoreLogEntry>>;
    async fn fetch_display_settings(&self) -> Result<DisplaySettings>;
    async fn register_student(&self, new: &NewStudent) -> Result<RegisterOutcome>;
    async fn fetch_student_credentials(&self, student_id: &str)
        -> Result<Option<StudentCredentials>>;
    /// Open a feed of change notifications. Payloads are hints only.
    async fn subscribe(&self) -> Result<Box<dyn ChangeFeed>>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PgStore {
    async fn fetch_teams(&self) -> Result<Vec<Team>> {
        crate::fetch_teams(&self.pool).await
    }

    async fn fetch_events(&self) -> Result<Vec<EventCategory>> {
        crate::fetch_events(&self.pool).await
    }

    async fn fetch_score_log(&self) -> Result<Vec<ScoreLogEntry>> {
        crate::fetch_score_log(&self.pool).await
    }

    async fn fetch_display_settings(&self) -> Result<DisplaySettings> {
        crate::fetch_display_settings(&self.pool).await
    }

    async fn register_student(&self, new: &NewStudent) -> Result<RegisterOutcome> {
        Ok(match crate::insert_student(&self.pool, new).await? {
            Some(student) => RegisterOutcome::Registered(student),
            None => RegisterOutcome::Duplicate,
        })
    }

    async fn fetch_student_credentials(
        &self,
        student_id: &str,
    ) -> Result<Option<StudentCredentials>> {
        crate::fetch_student_credentials(&self.pool, student_id).await
    }

    async fn subscribe(&self) -> Result<Box<dyn ChangeFeed>> {
        Ok(Box::new(PgChangeFeed::connect(&self.pool).await?))
    }
}
