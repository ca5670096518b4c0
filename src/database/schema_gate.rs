//! # Schema Gate
//!
//! One startup check of the deployed schema version against the version this
//! build requires. A mismatch refuses to boot; no query path ever falls back
//! to a reduced row shape at runtime.

use crate::constants::system::REQUIRED_SCHEMA_VERSION;
use crate::error::{CaseflowError, Result};
use sqlx::PgPool;
use tracing::info;

/// Verify the deployed schema version. Called once during worker startup.
pub async fn check_schema_version(pool: &PgPool) -> Result<()> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT version FROM caseflow_schema_info LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| CaseflowError::SchemaError(format!("Schema version query failed: {e}")))?;

    let version = row
        .map(|(version,)| version)
        .ok_or_else(|| CaseflowError::SchemaError("Schema version row is missing".to_string()))?;

    if version < REQUIRED_SCHEMA_VERSION {
        return Err(CaseflowError::SchemaError(format!(
            "Deployed schema version {version} is older than required version {REQUIRED_SCHEMA_VERSION}"
        )));
    }

    info!(
        deployed_version = version,
        required_version = REQUIRED_SCHEMA_VERSION,
        "Schema gate passed"
    );

    Ok(())
}
