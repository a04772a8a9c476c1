//! Adapters that translate the outside world into coordinator calls.

pub mod csv;
pub mod http;
pub mod seed;
