//! Analysis record repository — CRUD and guarded state transitions for
//! the `analyses` table.
//!
//! Terminal writes (`complete`, `fail`) and the `processing` claim are
//! single UPDATE statements guarded on the current status. The affected
//! row count tells the caller whether the transition happened; zero rows
//! means the record was already terminal (or missing), which is the
//! no-op path that makes duplicate job delivery safe.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::record::{AnalysisRecord, AnalysisStatus};

fn conversion_error(reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, reason.into())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(format!("bad timestamp '{}': {}", raw, e)))
}

fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn record_from_row(row: &Row<'_>) -> Result<AnalysisRecord, rusqlite::Error> {
    let status_raw: String = row.get("status")?;
    let status = AnalysisStatus::parse(&status_raw)
        .ok_or_else(|| conversion_error(format!("unknown status '{}'", status_raw)))?;

    let result = match row.get::<_, Option<String>>("result")? {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|e| conversion_error(format!("bad result payload: {}", e)))?,
        ),
        None => None,
    };

    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(AnalysisRecord {
        analysis_id: row.get("analysis_id")?,
        owner_id: row.get("owner_id")?,
        file_id: row.get("file_id")?,
        file_path: row.get("file_path")?,
        content_type: row.get("content_type")?,
        status,
        result,
        error_detail: row.get("error_detail")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Inserts a new record. Fails if the analysis id already exists.
pub fn insert(db: &Database, record: &AnalysisRecord) -> Result<(), DatabaseError> {
    let result = match &record.result {
        Some(value) => Some(serde_json::to_string(value)?),
        None => None,
    };
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO analyses (analysis_id, owner_id, file_id, file_path, content_type,
             status, result, error_detail, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.analysis_id,
                record.owner_id,
                record.file_id,
                record.file_path,
                record.content_type,
                record.status.as_str(),
                result,
                record.error_detail,
                encode_timestamp(&record.created_at),
                encode_timestamp(&record.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds a record by its analysis id.
pub fn find_by_id(db: &Database, analysis_id: &str) -> Result<Option<AnalysisRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM analyses WHERE analysis_id = ?1")?;
        let mut rows = stmt.query_map(params![analysis_id], record_from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all records owned by the given user, newest first.
pub fn list_by_owner(db: &Database, owner_id: &str) -> Result<Vec<AnalysisRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM analyses WHERE owner_id = ?1 ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map(params![owner_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists every record, newest first. Only reachable through the explicit
/// disabled-auth override.
pub fn list_all(db: &Database) -> Result<Vec<AnalysisRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM analyses ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts records with the given status.
pub fn count_by_status(db: &Database, status: AnalysisStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM analyses WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Claims a `pending` record for processing. Returns false if the record
/// is missing or no longer `pending` (another worker got there first, or
/// it already reached a terminal state).
pub fn mark_processing(
    db: &Database,
    analysis_id: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE analyses SET status = 'processing', updated_at = ?2
             WHERE analysis_id = ?1 AND status = 'pending'",
            params![analysis_id, updated_at],
        )?;
        Ok(affected > 0)
    })
}

/// Moves a record to `done` with its result payload, in one statement.
/// Returns false when the record was missing or already terminal; the
/// existing outcome is left untouched in that case.
pub fn complete(
    db: &Database,
    analysis_id: &str,
    result: &serde_json::Value,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    let encoded = serde_json::to_string(result)?;
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE analyses SET status = 'done', result = ?2, error_detail = NULL, updated_at = ?3
             WHERE analysis_id = ?1 AND status IN ('pending', 'processing')",
            params![analysis_id, encoded, updated_at],
        )?;
        Ok(affected > 0)
    })
}

/// Moves a record to `error` with a failure description, in one
/// statement. Same terminal guard as [`complete`].
pub fn fail(
    db: &Database,
    analysis_id: &str,
    error_detail: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE analyses SET status = 'error', error_detail = ?2, result = NULL, updated_at = ?3
             WHERE analysis_id = ?1 AND status IN ('pending', 'processing')",
            params![analysis_id, error_detail, updated_at],
        )?;
        Ok(affected > 0)
    })
}

/// Refreshes `updated_at` on a still-`pending` record. The re-enqueue
/// sweep uses this so one stuck record is not re-enqueued on every pass.
pub fn touch_pending(
    db: &Database,
    analysis_id: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "UPDATE analyses SET updated_at = ?2
             WHERE analysis_id = ?1 AND status = 'pending'",
            params![analysis_id, updated_at],
        )?;
        Ok(affected > 0)
    })
}

/// Returns `pending` records whose last update is at or before `cutoff`
/// (RFC3339). These are the stuck uploads the re-enqueue sweep picks up.
pub fn stale_pending(db: &Database, cutoff: &str) -> Result<Vec<AnalysisRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM analyses WHERE status = 'pending' AND updated_at <= ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![cutoff], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
