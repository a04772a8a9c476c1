//! Domain layer: orders, payment attempts, and the ports the application
//! layer depends on.

pub mod cart;
pub mod ids;
pub mod lifecycle;
pub mod money;
pub mod order;
pub mod ports;
pub mod transaction;
