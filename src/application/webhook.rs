use crate::domain::transaction::{GatewayReference, GatewayVerdict, Verdict};
use serde::Deserialize;

/// Event pushed by the payment gateway.
///
/// Only the fields needed for reconciliation are modelled; everything else
/// in the payload is ignored.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WebhookData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tx_ref: Option<String>,
}

impl WebhookEvent {
    /// Translates the event into a verdict for the reference it carries.
    ///
    /// Returns `None` for events that say nothing final about a charge, or
    /// that carry no reference.
    pub fn verdict(&self) -> Option<GatewayVerdict> {
        let status = self.data.status.as_deref();
        let verdict = if self.event == "charge.completed" && status == Some("successful") {
            Verdict::Success
        } else if self.event == "charge.failed" || status == Some("failed") {
            Verdict::Failure
        } else {
            return None;
        };
        let reference = self.data.tx_ref.as_deref().filter(|r| !r.trim().is_empty())?;
        Some(GatewayVerdict {
            reference: GatewayReference::new(reference.trim()),
            verdict,
        })
    }
}

/// What the webhook path did with an event. Used for logging only; the
/// gateway always receives an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Reconciled,
    Ignored,
    Failed,
}
