//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for asserting on emitted events
//!
//! The engine layer owns operation boundaries; store and core code only use
//! `tracing::debug!` for internal detail.
//!
//! ```rust
//! use decks_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
