//! Route handlers.

pub mod audio;
pub mod download;
pub mod health;
