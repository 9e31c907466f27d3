//! # Event subscribers.
//!
//! ```text
//! run / coordinator ── publish(Event) ──► Bus ──► listener (spawned by start)
//!                                                     │
//!                                               SubscriberSet::emit
//!                                          ┌──────────┼──────────┐
//!                                          ▼          ▼          ▼
//!                                      LogWriter   Metrics    Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
