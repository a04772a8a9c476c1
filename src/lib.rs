//! Order and payment lifecycle coordination.
//!
//! Orders are created from cart snapshots, paid through a hosted payment
//! gateway, and reconciled against the gateway's verdicts. Stores and the
//! gateway sit behind the traits in [`domain::ports`].

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
