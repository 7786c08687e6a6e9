//! Infrastructure layer for agodoc
//!
//! Contains low-level implementations and external integrations.

pub mod acme;
pub mod ast;
pub mod offset;
