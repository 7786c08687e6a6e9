//! agodoc - Go documentation lookup for the Acme editor
//!
//! Finds the identifier under the cursor of an Acme window, resolves it
//! against the package it belongs to and hands the result to `go doc`.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{AgodocError, AgodocResult};
