//! Static configuration
//!
//! Loaded once at startup from an optional TOML file and `PE__*`
//! environment variables.

mod structs;

pub use structs::*;
