// Resilience primitives shared across the engine.

pub mod pressure;

pub use pressure::{FixedPressure, PoolPressureGauge, ResourcePressure};
