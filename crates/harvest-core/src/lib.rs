//! Core types and trait definitions for DataHarvest.
//!
//! No database code lives here. Event sources produce
//! [`event::TelemetryEvent`]s; storage backends implement
//! [`sink::TelemetrySink`].

pub mod error;
pub mod event;
pub mod sink;
pub mod source;

pub use error::{Error, Result};
