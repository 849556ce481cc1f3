//! # Argus Common
//!
//! Shared types, traits, and utilities used across Argus components.
//!
//! ## Modules
//! - `types` - Core data structures (Verdict, ActiveSelection, RenderItem, etc.)
//! - `error` - Common error types
//! - `constants` - Shared configuration constants

pub mod constants;
pub mod error;
pub mod types;

pub use error::ArgusError;
pub use types::*;
