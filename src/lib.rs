// ABOUTME: Library root for one-image - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod manage;
pub mod one;
pub mod output;
pub mod types;
