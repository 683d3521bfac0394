//! # assetgate Library
//!
//! This library exposes the command implementations for testing and
//! integration.
//!
//! The binary wires them to the command line through `main.rs`.

pub mod cli;

// Re-export assetgate_core for convenience
pub use assetgate_core;
