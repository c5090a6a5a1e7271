use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tally_db::{ChangeFeed, ChangeNotice, RegisterOutcome, ScoreStore, StudentCredentials};
use tally_reveal::StandingsSnapshot;
use tally_schemas::{DisplaySettings, EventCategory, NewStudent, ScoreLogEntry, Student, Team};
use tokio::sync::mpsc;

#[derive(Default)]
struct Inner {
    snapshot: StandingsSnapshot,
    display: DisplaySettings,
    students: Vec<StudentCredentials>,
    unreachable: bool,
    subscribers: Vec<mpsc::UnboundedSender<ChangeNotice>>,
}

/// In-memory `ScoreStore`. Writes made through the setters do not notify
/// on their own; call [`MemoryStore::notify`] to simulate a trigger.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StandingsSnapshot) -> Self {
        let store = Self::new();
        store.set_snapshot(snapshot);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Ignore poisoning.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_snapshot(&self, snapshot: StandingsSnapshot) {
        self.lock().snapshot = snapshot;
    }

    pub fn set_team_score(&self, name: &str, score: Option<i64>) {
        let mut g = self.lock();
        if let Some(t) = g.snapshot.teams.iter_mut().find(|t| t.name == name) {
            t.score = score;
        }
    }

    pub fn push_log(&self, entry: ScoreLogEntry) {
        self.lock().snapshot.logs.push(entry);
    }

    pub fn set_display_settings(&self, display: DisplaySettings) {
        self.lock().display = display;
    }

    /// Every fetch fails while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Deliver a notice to every open feed. Returns how many received it.
    pub fn notify(&self, table: &str) -> usize {
        let mut g = self.lock();
        g.subscribers.retain(|tx| {
            tx.send(ChangeNotice {
                table: table.to_string(),
            })
            .is_ok()
        });
        g.subscribers.len()
    }

    pub fn student_count(&self) -> usize {
        self.lock().students.len()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.lock().unreachable {
            bail!("memory store marked unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn fetch_teams(&self) -> Result<Vec<Team>> {
        self.check_reachable()?;
        Ok(self.lock().snapshot.teams.clone())
    }

    async fn fetch_events(&self) -> Result<Vec<EventCategory>> {
        self.check_reachable()?;
        Ok(self.lock().snapshot.events.clone())
    }

    async fn fetch_score_log(&self) -> Result<Vec<ScoreLogEntry>> {
        self.check_reachable()?;
        Ok(self.lock().snapshot.logs.clone())
    }

    async fn fetch_display_settings(&self) -> Result<DisplaySettings> {
        self.check_reachable()?;
        Ok(self.lock().display.clone())
    }

    async fn register_student(&self, new: &NewStudent) -> Result<RegisterOutcome> {
        self.check_reachable()?;
        let mut g = self.lock();
        if g.students.iter().any(|c| c.student.student_id == new.student_id) {
            return Ok(RegisterOutcome::Duplicate);
        }
        let student = Student {
            id: uuid::Uuid::new_v4(),
            student_id: new.student_id.clone(),
            full_name: new.full_name.clone(),
            team_name: new.team_name.clone(),
            created_at_utc: chrono::Utc::now(),
        };
        g.students.push(StudentCredentials {
            student: student.clone(),
            password_salt: new.password_salt.clone(),
            password_hash: new.password_hash.clone(),
        });
        Ok(RegisterOutcome::Registered(student))
    }

    async fn fetch_student_credentials(
        &self,
        student_id: &str,
    ) -> Result<Option<StudentCredentials>> {
        self.check_reachable()?;
        Ok(self
            .lock()
            .students
            .iter()
            .find(|c| c.student.student_id == student_id)
            .cloned())
    }

    async fn subscribe(&self) -> Result<Box<dyn ChangeFeed>> {
        self.check_reachable()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        Ok(Box::new(MemoryChangeFeed { rx }))
    }
}

pub struct MemoryChangeFeed {
    rx: mpsc::UnboundedReceiver<ChangeNotice>,
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn next_change(&mut self) -> Option<ChangeNotice> {
        self.rx.recv().await
    }
}
