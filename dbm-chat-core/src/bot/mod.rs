//! Chat bot scaffold: events, an event bus and pluggable modules.

pub mod bus;
pub mod event;
pub mod module;
