use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PopcornError;

const SCHEMA: &str = include_str!("../../../migrations/001_initial.sql");

/// SQLite-backed ledger of movies the user has already sent for download,
/// plus hidden/watched marks and a small settings table.
///
/// Opened once per process lifetime. Writes commit before returning, so a
/// recorded download survives an immediate process exit.
pub struct Ledger {
    conn: Connection,
}

/// A persisted download record.
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    pub imdb_code: String,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

impl Ledger {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, PopcornError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, PopcornError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ── Downloads ───────────────────────────────────────────────

    /// Record a movie as sent for download. Idempotent: recording the same
    /// IMDB code twice leaves exactly one row, keeping the original timestamp.
    pub fn record_download(&self, imdb_code: &str, title: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "INSERT INTO downloaded_movies (imdb_code, title, added_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(imdb_code) DO NOTHING",
            params![imdb_code, title, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Check whether a movie has been sent for download.
    pub fn is_downloaded(&self, imdb_code: &str) -> Result<bool, PopcornError> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM downloaded_movies WHERE imdb_code = ?1",
                params![imdb_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// All downloaded IMDB codes, for filtering a browse page in one pass.
    pub fn downloaded_codes(&self) -> Result<HashSet<String>, PopcornError> {
        let mut stmt = self
            .conn
            .prepare("SELECT imdb_code FROM downloaded_movies")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(codes)
    }

    /// All download records, newest first.
    pub fn all_downloads(&self) -> Result<Vec<DownloadRecord>, PopcornError> {
        let mut stmt = self.conn.prepare(
            "SELECT imdb_code, title, added_at FROM downloaded_movies
             ORDER BY added_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let added_at_str: String = row.get(2)?;
                Ok(DownloadRecord {
                    imdb_code: row.get(0)?,
                    title: row.get(1)?,
                    added_at: parse_datetime(&added_at_str),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Remove a download record (explicit user action).
    pub fn remove_download(&self, imdb_code: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "DELETE FROM downloaded_movies WHERE imdb_code = ?1",
            params![imdb_code],
        )?;
        Ok(())
    }

    // ── Hidden movies ───────────────────────────────────────────

    /// Hide a movie from the browse view.
    pub fn hide_movie(&self, imdb_code: &str, title: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO hidden_movies (imdb_code, title, hidden_at)
             VALUES (?1, ?2, ?3)",
            params![imdb_code, title, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn unhide_movie(&self, imdb_code: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "DELETE FROM hidden_movies WHERE imdb_code = ?1",
            params![imdb_code],
        )?;
        Ok(())
    }

    pub fn is_hidden(&self, imdb_code: &str) -> Result<bool, PopcornError> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM hidden_movies WHERE imdb_code = ?1",
                params![imdb_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    pub fn hidden_codes(&self) -> Result<HashSet<String>, PopcornError> {
        let mut stmt = self.conn.prepare("SELECT imdb_code FROM hidden_movies")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(codes)
    }

    // ── Watched movies ──────────────────────────────────────────

    /// Mark a movie as watched.
    pub fn mark_watched(
        &self,
        imdb_code: &str,
        title: &str,
        year: Option<u16>,
    ) -> Result<(), PopcornError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO watched_movies (imdb_code, title, year, watched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![imdb_code, title, year, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn unmark_watched(&self, imdb_code: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "DELETE FROM watched_movies WHERE imdb_code = ?1",
            params![imdb_code],
        )?;
        Ok(())
    }

    pub fn is_watched(&self, imdb_code: &str) -> Result<bool, PopcornError> {
        let row: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM watched_movies WHERE imdb_code = ?1",
                params![imdb_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    pub fn watched_codes(&self) -> Result<HashSet<String>, PopcornError> {
        let mut stmt = self.conn.prepare("SELECT imdb_code FROM watched_movies")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(codes)
    }

    // ── Settings ────────────────────────────────────────────────

    /// Get a setting value.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, PopcornError> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Set a setting value.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), PopcornError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Library folders configured for local scanning (semicolon-joined).
    pub fn library_folders(&self) -> Result<Vec<String>, PopcornError> {
        let joined = self.get_setting("library_folders")?.unwrap_or_default();
        Ok(joined
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn set_library_folders(&self, folders: &[String]) -> Result<(), PopcornError> {
        self.set_setting("library_folders", &folders.join(";"))
    }
}

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::default()
}
