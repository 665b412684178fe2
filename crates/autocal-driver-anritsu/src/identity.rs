//! Connection identity check.

use autocal_core::{InstrumentLink, SweepError, SweepResult};

use crate::commands::IDENTITY_QUERY;

/// Query `*IDN?` and require an exact match with `expected`.
///
/// Line terminators are stripped before comparing; nothing else is
/// normalized. Issues no writes, so a mismatch leaves the generator untouched.
pub async fn verify_identity(link: &dyn InstrumentLink, expected: &str) -> SweepResult<String> {
    let received = link
        .query(IDENTITY_QUERY)
        .await
        .map_err(SweepError::instrument)?;
    let received = received.trim_end_matches(['\r', '\n']).to_string();

    if received != expected {
        tracing::error!(expected, %received, "Unexpected instrument identity");
        return Err(SweepError::ConnectionIdentity {
            expected: expected.to_string(),
            received,
        });
    }

    tracing::info!(identity = %received, "Instrument identity verified");
    Ok(received)
}
