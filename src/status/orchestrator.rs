//! # Status Orchestrator
//!
//! The single writer of case status in the system. Every transition goes
//! through [`StatusOrchestrator::transition`], so the side effects — the
//! `updated_at` bump and the optional assignment-lock release — happen
//! uniformly no matter which component drives the change.

use crate::status::states::DetailedStatus;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("Case {case_id} not found")]
    CaseNotFound { case_id: i64 },

    #[error("Invalid status transition for case {case_id}: {from} -> {to}")]
    InvalidTransition {
        case_id: i64,
        from: String,
        to: String,
    },

    #[error("Stored status is not a known value: {value}")]
    UnknownStoredStatus { value: String },

    #[error("Database error during status transition: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StatusResult<T> = Result<T, StatusError>;

#[derive(Clone)]
pub struct StatusOrchestrator {
    pool: PgPool,
}

impl StatusOrchestrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Move a case to a new detailed status.
    ///
    /// Validates the move against the transition table, writes the status and
    /// substatus, bumps `updated_at`, and clears the assignment lock when
    /// `release_lock` is set. A same-status call is a no-op returned as Ok so
    /// retried handlers stay idempotent.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        case_id: i64,
        new_status: DetailedStatus,
        new_substatus: Option<&str>,
        release_lock: bool,
    ) -> StatusResult<()> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> = sqlx::query_as(
            "SELECT detailed_status FROM caseflow_cases WHERE case_id = $1 FOR UPDATE",
        )
        .bind(case_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current
            .ok_or(StatusError::CaseNotFound { case_id })?
            .0;

        let from: DetailedStatus = current
            .parse()
            .map_err(|_| StatusError::UnknownStoredStatus {
                value: current.clone(),
            })?;

        if from == new_status {
            tx.commit().await?;
            return Ok(());
        }

        if !from.can_transition_to(new_status) {
            return Err(StatusError::InvalidTransition {
                case_id,
                from: from.to_string(),
                to: new_status.to_string(),
            });
        }

        if release_lock {
            sqlx::query(
                "UPDATE caseflow_cases \
                 SET detailed_status = $2, detailed_substatus = $3, \
                     assigned_to = NULL, updated_at = NOW() \
                 WHERE case_id = $1",
            )
            .bind(case_id)
            .bind(new_status.to_string())
            .bind(new_substatus)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE caseflow_cases \
                 SET detailed_status = $2, detailed_substatus = $3, updated_at = NOW() \
                 WHERE case_id = $1",
            )
            .bind(case_id)
            .bind(new_status.to_string())
            .bind(new_substatus)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            case_id = case_id,
            from = %from,
            to = %new_status,
            released_lock = release_lock,
            "Case status transitioned"
        );

        Ok(())
    }
}
