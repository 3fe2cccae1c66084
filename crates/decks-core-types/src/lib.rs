//! Core types shared across the decks facilities
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: canonical log field keys and event names
//! - **Topics**: action and event names used on the mesh

pub mod correlation;
pub mod schema;
pub mod topics;

pub use correlation::{RequestContext, RequestId, TraceId};
