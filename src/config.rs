use crate::error::{CaseflowError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CaseflowConfig {
    pub database_url: String,
    pub poll_interval_ms: u64,
    pub batch_size: i64,
    pub inter_event_delay_ms: u64,
    pub max_resend_attempts: i32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub letter_retry_limit: u32,
    pub letter_service_url: String,
    pub payload_version: i32,
    pub pool_pressure_threshold: f64,
    pub telemetry_enabled: bool,
    pub custom_settings: HashMap<String, String>,
}

impl Default for CaseflowConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/caseflow_development".to_string(),
            poll_interval_ms: 5000,
            batch_size: 25,
            inter_event_delay_ms: 100,
            max_resend_attempts: 3,
            backoff_base_ms: 1000,
            backoff_max_ms: 60000,
            letter_retry_limit: 3,
            letter_service_url: "http://localhost:8085/letters".to_string(),
            payload_version: crate::constants::system::PAYLOAD_VERSION,
            pool_pressure_threshold: 0.9,
            telemetry_enabled: true,
            custom_settings: HashMap::new(),
        }
    }
}

impl CaseflowConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(interval) = std::env::var("CASEFLOW_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval.parse().map_err(|e| {
                CaseflowError::ConfigurationError(format!("Invalid poll_interval_ms: {e}"))
            })?;
        }

        if let Ok(batch) = std::env::var("CASEFLOW_BATCH_SIZE") {
            config.batch_size = batch.parse().map_err(|e| {
                CaseflowError::ConfigurationError(format!("Invalid batch_size: {e}"))
            })?;
        }

        if let Ok(delay) = std::env::var("CASEFLOW_INTER_EVENT_DELAY_MS") {
            config.inter_event_delay_ms = delay.parse().map_err(|e| {
                CaseflowError::ConfigurationError(format!("Invalid inter_event_delay_ms: {e}"))
            })?;
        }

        if let Ok(attempts) = std::env::var("CASEFLOW_MAX_RESEND_ATTEMPTS") {
            config.max_resend_attempts = attempts.parse().map_err(|e| {
                CaseflowError::ConfigurationError(format!("Invalid max_resend_attempts: {e}"))
            })?;
        }

        if let Ok(url) = std::env::var("CASEFLOW_LETTER_SERVICE_URL") {
            config.letter_service_url = url;
        }

        if let Ok(threshold) = std::env::var("CASEFLOW_POOL_PRESSURE_THRESHOLD") {
            config.pool_pressure_threshold = threshold.parse().map_err(|e| {
                CaseflowError::ConfigurationError(format!("Invalid pool_pressure_threshold: {e}"))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CaseflowConfig::default();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.max_resend_attempts, 3);
        assert!(config.pool_pressure_threshold > 0.0);
    }
}
