//! Request/response channel to the signal generator.

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Point-to-point command channel to a SCPI instrument.
///
/// Implementations serialize access internally, so a link can be shared
/// behind an `Arc` between the sweep and the output-enable guard.
#[async_trait]
pub trait InstrumentLink: Send + Sync {
    /// Send a command without expecting a response.
    async fn write(&self, command: &str) -> Result<()>;

    /// Send a query and return the trimmed response line.
    async fn query(&self, command: &str) -> Result<String>;

    /// Release the connection. Any later call fails.
    async fn close(&self) -> Result<()>;

    /// Query a floating-point value.
    async fn query_f64(&self, command: &str) -> Result<f64> {
        let response = self.query(command).await?;
        response.trim().parse::<f64>().with_context(|| {
            format!(
                "Failed to parse '{}' as f64 from query: {}",
                response, command
            )
        })
    }
}
