//! Payment webhook DTOs

use serde::Serialize;

/// Acknowledgement for an event the engine will not act on
///
/// Returned with `200` so the gateway stops redelivering it.
#[derive(Debug, Serialize)]
pub struct WebhookRejected {
    pub acknowledged: bool,
    pub error: &'static str,
    pub message: String,
}
