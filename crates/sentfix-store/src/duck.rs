//! DuckDB implementation of [`PatternStore`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use duckdb::{Connection, OptionalExt, params};
use sentfix_core::{AnalysisRecord, DiffOp, MissType};
use serde::Serialize;
use tracing::info;

use crate::StoreError;
use crate::pattern::{Occurrence, PatternStore, RecordOutcome};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS auto_error_patterns_id_seq START 1;
CREATE TABLE IF NOT EXISTS auto_error_patterns (
    id                      BIGINT PRIMARY KEY DEFAULT nextval('auto_error_patterns_id_seq'),
    original_sentence       VARCHAR NOT NULL,
    language_tool_corrected VARCHAR NOT NULL,
    llm_refined_sentence    VARCHAR NOT NULL,
    diff_details            VARCHAR NOT NULL,
    miss_type               VARCHAR NOT NULL,
    occurrence_count        BIGINT  NOT NULL,
    last_detected_at        TIMESTAMP NOT NULL,
    refinement_failed       BOOLEAN NOT NULL,
    UNIQUE (original_sentence, llm_refined_sentence)
);
";

#[cfg(test)]
thread_local! {
    /// Makes the next `record_occurrence` on this thread fail after its write.
    static FAIL_AFTER_WRITE: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

#[cfg(test)]
fn after_write() -> Result<(), StoreError> {
    if FAIL_AFTER_WRITE.with(|f| f.replace(false)) {
        return Err(StoreError::Other("failed after write".into()));
    }
    Ok(())
}

#[cfg(not(test))]
fn after_write() -> Result<(), StoreError> {
    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, original_sentence, language_tool_corrected, \
     llm_refined_sentence, diff_details, miss_type, occurrence_count, \
     epoch_us(last_detected_at), refinement_failed \
     FROM auto_error_patterns";

/// DuckDB store for the `auto_error_patterns` table.
///
/// One row per distinct `(original_sentence, llm_refined_sentence)` pair,
/// enforced by a unique constraint. Every [`record_occurrence`] runs in its
/// own transaction on a single mutex-guarded connection, so lookups and
/// increments for the same pair never interleave.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
///
/// [`record_occurrence`]: PatternStore::record_occurrence
pub struct DuckPatternStore {
    conn: Mutex<Connection>,
}

/// `DiffOp` as stored: the opcode plus its human-readable description.
#[derive(Serialize)]
struct StoredDiffOp<'a> {
    #[serde(flatten)]
    op: &'a DiffOp,
    description: String,
}

/// Column values before decoding JSON, enum, and timestamp fields.
struct RawRow {
    id: i64,
    original_sentence: String,
    language_tool_corrected: String,
    llm_refined_sentence: String,
    diff_details: String,
    miss_type: String,
    occurrence_count: i64,
    last_detected_us: i64,
    refinement_failed: bool,
}

impl RawRow {
    fn from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            original_sentence: row.get(1)?,
            language_tool_corrected: row.get(2)?,
            llm_refined_sentence: row.get(3)?,
            diff_details: row.get(4)?,
            miss_type: row.get(5)?,
            occurrence_count: row.get(6)?,
            last_detected_us: row.get(7)?,
            refinement_failed: row.get(8)?,
        })
    }

    fn decode(self) -> Result<AnalysisRecord, StoreError> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let diff_details: Vec<DiffOp> = serde_json::from_str(&self.diff_details)?;
        let miss_type: MissType = self.miss_type.parse().map_err(corrupt)?;
        let occurrence_count = u64::try_from(self.occurrence_count)
            .map_err(|_| corrupt(format!("negative count {}", self.occurrence_count)))?;
        let last_detected_at = DateTime::<Utc>::from_timestamp_micros(self.last_detected_us)
            .ok_or_else(|| corrupt(format!("timestamp out of range: {}", self.last_detected_us)))?;

        Ok(AnalysisRecord {
            id,
            original_sentence: self.original_sentence,
            language_tool_corrected: self.language_tool_corrected,
            llm_refined_sentence: self.llm_refined_sentence,
            diff_details,
            miss_type,
            occurrence_count,
            last_detected_at,
            refinement_failed: self.refinement_failed,
        })
    }
}

impl DuckPatternStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened pattern store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn find_by_key(
        conn: &Connection,
        original: &str,
        refined: &str,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let sql =
            format!("{SELECT_COLUMNS} WHERE original_sentence = ? AND llm_refined_sentence = ?");
        let raw = conn
            .query_row(&sql, params![original, refined], RawRow::from_row)
            .optional()?;
        raw.map(RawRow::decode).transpose()
    }

    fn find_by_id(conn: &Connection, id: i64) -> Result<AnalysisRecord, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        let raw = conn
            .query_row(&sql, params![id], RawRow::from_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        raw.decode()
    }
}

impl PatternStore for DuckPatternStore {
    fn record_occurrence(&self, occurrence: &Occurrence) -> Result<RecordOutcome, StoreError> {
        let mut conn = self.lock()?;
        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction()?;
        let now_us = Utc::now().timestamp_micros();

        let existing = Self::find_by_key(
            &tx,
            &occurrence.original_sentence,
            &occurrence.llm_refined_sentence,
        )?;

        let outcome = match existing {
            Some(found) => {
                tx.execute(
                    "UPDATE auto_error_patterns \
                     SET occurrence_count = occurrence_count + 1, \
                         last_detected_at = make_timestamp(?) \
                     WHERE id = ?",
                    params![now_us, found.id],
                )?;
                after_write()?;
                let record = Self::find_by_id(&tx, found.id)?;
                info!(
                    id = record.id,
                    count = record.occurrence_count,
                    "existing pattern updated"
                );
                RecordOutcome {
                    record,
                    was_new: false,
                }
            }
            None => {
                let stored: Vec<StoredDiffOp<'_>> = occurrence
                    .diff_details
                    .iter()
                    .map(|op| StoredDiffOp {
                        op,
                        description: op.description(),
                    })
                    .collect();
                let diff_json = serde_json::to_string(&stored)?;

                tx.execute(
                    "INSERT INTO auto_error_patterns (original_sentence, language_tool_corrected, \
                         llm_refined_sentence, diff_details, miss_type, occurrence_count, \
                         last_detected_at, refinement_failed) \
                     VALUES (?, ?, ?, ?, ?, 1, make_timestamp(?), ?)",
                    params![
                        occurrence.original_sentence,
                        occurrence.language_tool_corrected,
                        occurrence.llm_refined_sentence,
                        diff_json,
                        occurrence.miss_type.as_str(),
                        now_us,
                        occurrence.refinement_failed,
                    ],
                )?;
                after_write()?;
                let record = Self::find_by_key(
                    &tx,
                    &occurrence.original_sentence,
                    &occurrence.llm_refined_sentence,
                )?
                .ok_or_else(|| StoreError::Other("inserted pattern not visible".into()))?;
                info!(id = record.id, miss_type = %record.miss_type, "new pattern inserted");
                RecordOutcome {
                    record,
                    was_new: true,
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get(&self, id: i64) -> Result<AnalysisRecord, StoreError> {
        let conn = self.lock()?;
        Self::find_by_id(&conn, id)
    }

    fn top_patterns(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "{SELECT_COLUMNS} ORDER BY occurrence_count DESC, last_detected_at DESC, id ASC \
             LIMIT {limit}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawRow::from_row)?;
        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.decode()?);
        }
        Ok(records)
    }

    fn pattern_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT count(*) FROM auto_error_patterns", [], |row| {
                row.get(0)
            })?;
        usize::try_from(count).map_err(|_| StoreError::Other(format!("bad pattern count {count}")))
    }
}
