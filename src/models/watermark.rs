//! # Watermark Model
//!
//! Single durable cursor over the inbound event stream. Read at the start of
//! every poll cycle, advanced only at the end, and merged with GREATEST
//! semantics so concurrent advances from N workers never move it backward.
//!
//! ## Database Schema
//!
//! Maps to `caseflow_watermarks` (one row, `watermark_id = 1`):
//! ```sql
//! CREATE TABLE caseflow_watermarks (
//!   watermark_id INTEGER PRIMARY KEY,
//!   last_seen_at TIMESTAMP NOT NULL,
//!   last_seen_event_id BIGINT NOT NULL,
//!   updated_at TIMESTAMP NOT NULL
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

const INBOX_WATERMARK_ID: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Watermark {
    pub watermark_id: i32,
    pub last_seen_at: NaiveDateTime,
    pub last_seen_event_id: i64,
    pub updated_at: NaiveDateTime,
}

impl Watermark {
    /// Read the inbox watermark. The row is seeded by the schema migration,
    /// so absence is a schema defect rather than a normal state.
    pub async fn fetch(conn: &mut PgConnection) -> Result<Watermark, sqlx::Error> {
        sqlx::query_as::<_, Watermark>(
            "SELECT watermark_id, last_seen_at, last_seen_event_id, updated_at \
             FROM caseflow_watermarks WHERE watermark_id = $1",
        )
        .bind(INBOX_WATERMARK_ID)
        .fetch_one(&mut *conn)
        .await
    }

    /// Advance the watermark to `(candidate_at, candidate_event_id)` unless a
    /// concurrent worker already moved it further.
    ///
    /// The merge keeps the greatest `(timestamp, id)` pair: the candidate
    /// wins only when its timestamp is strictly newer, or equal with a higher
    /// event id. Two workers advancing in either order converge on the
    /// maximum, so the cursor is monotone.
    pub async fn advance(
        conn: &mut PgConnection,
        candidate_at: NaiveDateTime,
        candidate_event_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE caseflow_watermarks \
             SET last_seen_at = CASE \
                   WHEN $2 > last_seen_at THEN $2 \
                   WHEN $2 = last_seen_at AND $3 > last_seen_event_id THEN $2 \
                   ELSE last_seen_at END, \
                 last_seen_event_id = CASE \
                   WHEN $2 > last_seen_at THEN $3 \
                   WHEN $2 = last_seen_at AND $3 > last_seen_event_id THEN $3 \
                   ELSE last_seen_event_id END, \
                 updated_at = NOW() \
             WHERE watermark_id = $1",
        )
        .bind(INBOX_WATERMARK_ID)
        .bind(candidate_at)
        .bind(candidate_event_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
