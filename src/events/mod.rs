//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor` (queue/replace/shutdown), the run driver
//!   (starting/stopped/failed), the coordinating loop (outcome observed),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the listener spawned by `Supervisor::start`, which forwards
//!   to the [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
