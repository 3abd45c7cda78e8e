//! # audiogate-core
//!
//! Core crate for AudioGate. Contains configuration schemas, the clock and
//! storage traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other AudioGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
