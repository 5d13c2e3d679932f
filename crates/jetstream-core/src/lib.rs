//! # JetStream Core
//!
//! Shared foundation for the JetStream workspace: configuration,
//! error types, record/payload types, and the transport traits the
//! dispatch engine is written against.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::JetStreamConfig;
pub use error::{JetStreamError, Result};
pub use traits::{DeliveryTransport, Notifier};
pub use types::{DeliveryFailure, EventPayload, EventRecord};
