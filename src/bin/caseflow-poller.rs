//! Worker entry point: one inbox poller per process.

use anyhow::Context;
use caseflow_core::config::CaseflowConfig;
use caseflow_core::database;
use caseflow_core::decision::DecisionMutator;
use caseflow_core::inbox::{EventDispatcher, InboxPoller};
use caseflow_core::logging;
use caseflow_core::outbox::OutboxWriter;
use caseflow_core::resilience::PoolPressureGauge;
use caseflow_core::status::StatusOrchestrator;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    let config = CaseflowConfig::from_env().context("Failed to load configuration")?;
    let pool = database::connect_pool(&config.database_url, 10)
        .await
        .context("Failed to connect database pool")?;

    database::check_schema_version(&pool)
        .await
        .context("Schema gate failed")?;

    let mutator = DecisionMutator::new(pool.clone());
    let status = StatusOrchestrator::new(pool.clone());
    let outbox = OutboxWriter::new(
        pool.clone(),
        config.payload_version,
        config.max_resend_attempts,
    );
    let dispatcher = EventDispatcher::new(pool.clone(), mutator, outbox, status);
    let pressure = Arc::new(PoolPressureGauge::new(
        pool.clone(),
        config.pool_pressure_threshold,
    ));

    let poller = InboxPoller::new(pool, dispatcher, pressure, &config);
    let shutdown = poller.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, finishing current batch");
            shutdown.store(true, Ordering::Release);
        }
    });

    poller.run().await;

    Ok(())
}
