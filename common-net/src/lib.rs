pub mod config;
pub mod metrics;
pub mod shutdown;
pub mod telemetry;
pub mod time;

pub use metrics::BoxError;
