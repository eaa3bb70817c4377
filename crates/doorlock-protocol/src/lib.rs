//! Wireless-facing lock service.
//!
//! [`LockService`] is the glue between a GATT-style transport and the
//! controller: it serves lock-state reads, turns lock-command writes into
//! unlock requests, and pushes [`LockStatePayload`]s to subscribed
//! connections whenever the controller reports a change.

pub mod payload;
pub mod service;

pub use payload::{LockStatePayload, hex};
pub use service::{ConnectionId, LockService, Notifier};
