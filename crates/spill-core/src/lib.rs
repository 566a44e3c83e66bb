//! Access-control and rating engine for answer-to-unlock rooms.
//!
//! Storage is reached only through the traits in [`ports`]; everything else
//! here is validation, orchestration and the per-viewer projection.

pub mod answers;
pub mod error;
pub mod ports;
pub mod rating;
pub mod unlock;
pub mod validation;
pub mod visibility;

pub use error::{Result, SpillError};
