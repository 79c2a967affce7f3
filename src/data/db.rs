use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;

use crate::data::models::StorageError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Tables owned by the scheduler, plus the `questions` table it references.
/// Review times are Unix milliseconds; text timestamps stop sorting
/// correctly past year 9999.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS questions (
    question_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    question_text TEXT NOT NULL,
    answer_text TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS spacing_profiles (
    profile_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    intervals TEXT NOT NULL,
    ease_factor REAL NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS review_items (
    review_item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(question_id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL,
    spacing_profile_id INTEGER NOT NULL REFERENCES spacing_profiles(profile_id),
    last_reviewed INTEGER,
    next_review INTEGER,
    ease_factor REAL NOT NULL,
    interval_hours INTEGER NOT NULL,
    review_count INTEGER NOT NULL DEFAULT 0,
    performance_history TEXT NOT NULL DEFAULT '[]',
    UNIQUE (question_id, spacing_profile_id)
);

CREATE INDEX IF NOT EXISTS idx_review_items_user_next_review
    ON review_items (user_id, next_review);
"#;

/// Per-connection pragmas. Foreign keys are off by default in SQLite.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, StorageError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout: Duration::from_secs(5),
        }))
        .build(manager)?;
    Ok(pool)
}

/// Creates missing tables. Safe to run on every start.
pub fn run_schema(pool: &DbPool) -> Result<(), StorageError> {
    let mut conn = pool.get()?;
    conn.batch_execute(SCHEMA)?;
    log::info!("Database schema ready");
    Ok(())
}
