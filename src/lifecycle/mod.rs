//! Message lifecycle: placeholder, remote call, reconciliation, expiry
//!
//! - `MessageLifecycleController`: text / audio sends and history hydration
//! - `ExpiryScheduler`: unconditional removal after the message TTL
//! - `ChatError`: failure taxonomy shared with capture and the session layer

mod controller;
mod error;
mod expiry;

pub use controller::{ControllerConfig, Delivery, MessageLifecycleController, SendCounts};
pub use error::ChatError;
pub use expiry::ExpiryScheduler;
