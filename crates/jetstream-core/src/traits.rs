//! Transport traits — the seams between the dispatch engine and the
//! outside world.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DeliveryFailure, EventPayload};

/// Best-effort text notification capability.
///
/// Callers deliberately discard the result: a failed push must never
/// affect engine state. Returning it anyway keeps the discard explicit
/// at every call site.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Outbound event delivery.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Deliver one payload to the endpoint identified by `bundle`,
    /// authenticated with `credential`. Implementations bound the call
    /// with a timeout.
    async fn deliver(
        &self,
        bundle: &str,
        credential: &str,
        payload: &EventPayload,
    ) -> std::result::Result<(), DeliveryFailure>;
}

/// A notifier that drops everything. Used when Telegram is not
/// configured, and as a stand-in under test.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}
