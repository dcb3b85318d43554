use crate::batch::BatchResult;
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::path::Path;
use verbprobe_scanner::ScanOutcome;

const UPSERT_RESULT: &str = "INSERT INTO link_check_results (url, results, checked_at, session_id)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(url) DO UPDATE SET
        results = excluded.results,
        checked_at = excluded.checked_at,
        session_id = excluded.session_id";

pub struct Database {
    conn: Connection,
}

/// A stored per-URL result
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub url: String,
    pub outcome: ScanOutcome,
    /// RFC 3339 timestamp of the last check
    pub checked_at: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
    pub seed_urls: String,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn to_sql_error(e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS scan_sessions (
                id TEXT PRIMARY KEY,
                start_time INTEGER NOT NULL,
                end_time INTEGER,
                status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed')),
                seed_urls TEXT NOT NULL  -- JSON array
            );

            -- Latest result per URL
            CREATE TABLE IF NOT EXISTS link_check_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                results TEXT NOT NULL,   -- JSON method map or the unreachable message
                checked_at TEXT NOT NULL,
                session_id TEXT,
                FOREIGN KEY(session_id) REFERENCES scan_sessions(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_results_session ON link_check_results(session_id);
            ",
        )?;
        Ok(())
    }

    // Session management
    pub fn create_session(&self, seed_urls: &[String]) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let seeds = serde_json::to_string(seed_urls).map_err(to_sql_error)?;

        self.conn.execute(
            "INSERT INTO scan_sessions (id, start_time, status, seed_urls) VALUES (?1, ?2, ?3, ?4)",
            params![&session_id, current_timestamp(), "running", seeds],
        )?;

        Ok(session_id)
    }

    pub fn complete_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "completed")
    }

    pub fn fail_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "failed")
    }

    fn finish_session(&self, session_id: &str, status: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE scan_sessions SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status, current_timestamp(), session_id],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        self.conn
            .query_row(
                "SELECT id, start_time, end_time, status, seed_urls FROM scan_sessions WHERE id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionInfo {
                        id: row.get(0)?,
                        start_time: row.get(1)?,
                        end_time: row.get(2)?,
                        status: row.get(3)?,
                        seed_urls: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    // Result storage
    /// Persist the merged view of a batch in one session. Returns the
    /// session id. Rejected inputs are not stored.
    pub fn save_batch(&mut self, inputs: &[String], result: &BatchResult) -> Result<String> {
        let session_id = self.create_session(inputs)?;

        let tx = self.conn.transaction()?;
        {
            let checked_at = chrono::Utc::now().to_rfc3339();
            let mut stmt = tx.prepare(UPSERT_RESULT)?;
            for (url, outcome) in result.merged() {
                let results = serde_json::to_string(&outcome).map_err(to_sql_error)?;
                stmt.execute(params![url, results, checked_at, &session_id])?;
            }
        }
        tx.commit()?;

        self.complete_session(&session_id)?;
        Ok(session_id)
    }

    pub fn get_result(&self, url: &str) -> Result<Option<StoredResult>> {
        self.conn
            .query_row(
                "SELECT url, results, checked_at, session_id FROM link_check_results WHERE url = ?1",
                params![url],
                row_to_result,
            )
            .optional()
    }

    pub fn list_results(&self) -> Result<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, results, checked_at, session_id FROM link_check_results ORDER BY url",
        )?;

        let results = stmt
            .query_map([], row_to_result)?
            .collect::<Result<Vec<_>>>()?;

        Ok(results)
    }

    pub fn get_results_by_session(&self, session_id: &str) -> Result<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, results, checked_at, session_id FROM link_check_results
             WHERE session_id = ?1 ORDER BY url",
        )?;

        let results = stmt
            .query_map(params![session_id], row_to_result)?
            .collect::<Result<Vec<_>>>()?;

        Ok(results)
    }
}

fn row_to_result(row: &rusqlite::Row<'_>) -> Result<StoredResult> {
    let results: String = row.get(1)?;
    let outcome = serde_json::from_str(&results).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredResult {
        url: row.get(0)?,
        outcome,
        checked_at: row.get(2)?,
        session_id: row.get(3)?,
    })
}
