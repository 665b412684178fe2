//! Anritsu MG369xC microwave signal generator driver.
//!
//! This crate provides the instrument side of the calibration sweep:
//!
//! - [`ScpiClient`] - SCPI over a raw TCP socket, implementing
//!   [`InstrumentLink`](autocal_core::InstrumentLink)
//! - [`MockSignalGenerator`] - in-process simulation for tests and dry runs
//! - [`commands`] - the SCPI vocabulary used by the sweep
//! - [`verify_identity`] - the startup `*IDN?` check
//!
//! # Usage
//!
//! ```rust,ignore
//! use autocal_driver_anritsu::{InstrumentConfig, ScpiClient, verify_identity, EXPECTED_IDENTITY};
//!
//! let config = InstrumentConfig::default();
//! let client = ScpiClient::connect(&config).await?;
//! verify_identity(&client, EXPECTED_IDENTITY).await?;
//! ```

pub mod commands;
mod config;
mod identity;
mod mock;
mod scpi;

pub use commands::{ScpiSetting, SourceAxis};
pub use config::{InstrumentConfig, DEFAULT_PORT, DEFAULT_TIMEOUT, EXPECTED_IDENTITY};
pub use identity::verify_identity;
pub use mock::MockSignalGenerator;
pub use scpi::ScpiClient;
