//! Acme editor integration
//!
//! A minimal 9P2000 client for plan9port's Acme file server.

pub mod conn;
pub mod fcall;
pub mod win;

pub use conn::namespace;
pub use win::Win;
