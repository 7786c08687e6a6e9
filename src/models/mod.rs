//! Data models for agodoc
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod symbol;
pub mod window;

// Re-export commonly used types
pub use config::AgodocConfig;
pub use symbol::{LookupKey, Object, ObjectKind, Owner, ResolvedSymbol};
pub use window::{Selection, WindowState};
