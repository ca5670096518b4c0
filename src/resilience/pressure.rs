//! # Resource Pressure Gauge
//!
//! Explicitly injected backpressure signal the poller consults before sizing
//! a batch. The pool-backed implementation reads connection-pool occupancy;
//! the fixed implementation exists for tests and for deployments that want
//! backpressure off.

use sqlx::PgPool;

/// Saturation signal for a shared resource
pub trait ResourcePressure: Send + Sync {
    fn saturated(&self) -> bool;
}

/// Pool-occupancy gauge: saturated when the share of checked-out connections
/// crosses the configured threshold.
pub struct PoolPressureGauge {
    pool: PgPool,
    threshold: f64,
}

impl PoolPressureGauge {
    pub fn new(pool: PgPool, threshold: f64) -> Self {
        Self {
            pool,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl ResourcePressure for PoolPressureGauge {
    fn saturated(&self) -> bool {
        let size = self.pool.size();
        if size == 0 {
            return false;
        }
        let in_use = size.saturating_sub(self.pool.num_idle() as u32);
        f64::from(in_use) / f64::from(size) >= self.threshold
    }
}

/// Fixed-value gauge for tests and for disabling backpressure
pub struct FixedPressure {
    saturated: parking_lot::Mutex<bool>,
}

impl FixedPressure {
    pub fn new(saturated: bool) -> Self {
        Self {
            saturated: parking_lot::Mutex::new(saturated),
        }
    }

    pub fn set(&self, saturated: bool) {
        *self.saturated.lock() = saturated;
    }
}

impl ResourcePressure for FixedPressure {
    fn saturated(&self) -> bool {
        *self.saturated.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pressure_toggles() {
        let gauge = FixedPressure::new(false);
        assert!(!gauge.saturated());

        gauge.set(true);
        assert!(gauge.saturated());
    }
}
