//! Core domain types and operations for issue reporting.
//!
//! This module provides the domain layer containing:
//! - **types**: Core data structures (Issue, User, Status, Priority, Session, etc.)
//! - **queries**: Pure filter and summary operations on issue collections
//!
//! The domain layer has no knowledge of the network and can be used
//! directly by any front-end.

pub mod queries;
pub mod types;

pub use types::*;
