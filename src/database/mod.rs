//! Database bootstrap: pool construction and the startup schema gate.

pub mod schema_gate;

pub use schema_gate::check_schema_version;

use crate::error::{CaseflowError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connect a pool with the engine's defaults
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await
        .map_err(|e| CaseflowError::DatabaseError(format!("Failed to connect pool: {e}")))
}
