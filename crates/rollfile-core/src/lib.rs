//! Rollfile core - shared error type, clock abstraction, and sink contract

pub mod clock;
pub mod constants;
pub mod error;
pub mod sink;

pub use clock::{Clock, ManualClock, SystemClock};
pub use constants::*;
pub use error::{Error, Result};
pub use sink::SyncCloseWrite;
