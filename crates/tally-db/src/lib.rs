use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tally_schemas::{DisplaySettings, EventCategory, ScoreLogEntry, Student, Team};

mod changes;
mod store;
pub mod students;

pub use changes::{ChangeFeed, ChangeNotice, PgChangeFeed, CHANGE_CHANNEL};
pub use store::{PgStore, RegisterOutcome, ScoreStore, StudentCredentials};

pub const ENV_DB_URL: &str = "TALLY_DATABASE_URL";

/// Postgres "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

/// Connect to Postgres at `url`.
pub async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")
}

/// Pool that connects on first use. Lets a caller start while the
/// database is still down.
pub fn connect_lazy(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(url)
        .context("invalid Postgres connection url")
}

/// Connect using TALLY_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_teams_table: bool,
    pub has_events_table: bool,
}

/// Connectivity plus schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_teams_table: table_exists(pool, "teams").await?,
        has_events_table: table_exists(pool, "events").await?,
    })
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = 'public' and table_name = $1
        )
        "#,
    )
    .bind(table)
    .fetch_one(pool)
    .await
    .with_context(|| format!("table-exists query failed: {table}"))?;
    Ok(exists)
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNDEFINED_TABLE),
        _ => false,
    }
}

/// All teams, highest stored score first. NULL scores sort last.
pub async fn fetch_teams(pool: &PgPool) -> Result<Vec<Team>> {
    let rows = sqlx::query(
        r#"
        select id, name, score
        from teams
        order by score desc nulls last, name asc
        "#,
    )
    .fetch_all(pool)
    .await
    .context("fetch_teams failed")?;

    rows.iter()
        .map(|row| -> Result<Team> {
            Ok(Team {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                score: row.try_get("score")?,
            })
        })
        .collect()
}

/// The event catalog. A missing `events` table is a valid, empty catalog.
pub async fn fetch_events(pool: &PgPool) -> Result<Vec<EventCategory>> {
    let res = sqlx::query("select id, name from events order by name asc")
        .fetch_all(pool)
        .await;

    let rows = match res {
        Ok(rows) => rows,
        Err(e) if is_undefined_table(&e) => return Ok(Vec::new()),
        Err(e) => return Err(anyhow::Error::new(e).context("fetch_events failed")),
    };

    rows.iter()
        .map(|row| -> Result<EventCategory> {
            Ok(EventCategory {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

/// Every score-log row, in bulk.
pub async fn fetch_score_log(pool: &PgPool) -> Result<Vec<ScoreLogEntry>> {
    let rows = sqlx::query("select team_name, reason, delta from score_log")
        .fetch_all(pool)
        .await
        .context("fetch_score_log failed")?;

    rows.iter()
        .map(|row| -> Result<ScoreLogEntry> {
            Ok(ScoreLogEntry {
                team_name: row.try_get("team_name")?,
                reason: row
                    .try_get::<Option<String>, _>("reason")?
                    .unwrap_or_default(),
                delta: row.try_get("delta")?,
            })
        })
        .collect()
}

/// The single settings row; defaults when the row is absent.
pub async fn fetch_display_settings(pool: &PgPool) -> Result<DisplaySettings> {
    let row = sqlx::query("select public_redirect from display_settings where id = 1")
        .fetch_optional(pool)
        .await
        .context("fetch_display_settings failed")?;

    match row {
        Some(row) => Ok(DisplaySettings {
            public_redirect: row
                .try_get::<Option<String>, _>("public_redirect")?
                .filter(|s| !s.trim().is_empty()),
        }),
        None => Ok(DisplaySettings::default()),
    }
}

/// Insert a student. Returns `None` when `student_id` is already taken.
pub async fn insert_student(
    pool: &PgPool,
    new: &tally_schemas::NewStudent,
) -> Result<Option<Student>> {
    let row = sqlx::query(
        r#"
        insert into students (
          id, student_id, full_name, team_name, password_salt, password_hash
        ) values (
          $1, $2, $3, $4, $5, $6
        )
        on conflict (student_id) do nothing
        returning id, student_id, full_name, team_name, created_at_utc
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(&new.student_id)
    .bind(&new.full_name)
    .bind(&new.team_name)
    .bind(&new.password_salt)
    .bind(&new.password_hash)
    .fetch_optional(pool)
    .await
    .context("insert_student failed")?;

    row.map(|row| student_from_row(&row)).transpose()
}

pub async fn fetch_student_credentials(
    pool: &PgPool,
    student_id: &str,
) -> Result<Option<StudentCredentials>> {
    let row = sqlx::query(
        r#"
        select id, student_id, full_name, team_name, created_at_utc,
               password_salt, password_hash
        from students
        where student_id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
    .context("fetch_student_credentials failed")?;

    row.map(|row| -> Result<StudentCredentials> {
        Ok(StudentCredentials {
            student: student_from_row(&row)?,
            password_salt: row.try_get("password_salt")?,
            password_hash: row.try_get("password_hash")?,
        })
    })
    .transpose()
}

fn student_from_row(row: &sqlx::postgres::PgRow) -> Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        full_name: row.try_get("full_name")?,
        team_name: row.try_get("team_name")?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}
