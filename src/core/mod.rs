//! Core types and foundational components
//!
//! This module contains the fundamental data types, link normalization,
//! error handling, and constants used throughout the application.

pub mod constants;
pub mod error;
pub mod normalize;
pub mod types;

// Re-export commonly used items for convenience
pub use error::{LinkrotError, Result};
pub use normalize::{LinkKind, MalformedTarget, NormalizedLink, TargetKind};
pub use types::{LinkReference, LinkReferenceError, LinkStatus, ValidationOutcome};
