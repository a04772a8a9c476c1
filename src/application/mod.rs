//! Application layer containing the order lifecycle orchestration.
//!
//! `OrderCoordinator` is the single entry point used by every inbound path:
//! checkout, payment initiation, client verification, gateway webhooks,
//! administrative updates and the operator replay sweep.

pub mod coordinator;
pub mod reference;
pub mod webhook;
