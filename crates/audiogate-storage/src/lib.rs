//! # audiogate-storage
//!
//! Storage provider for the downloads directory that every issued token
//! points into, plus the startup purge of files no token can reach.

pub mod providers;
pub mod purge;

pub use providers::local::LocalStorageProvider;
pub use purge::OrphanPurge;
