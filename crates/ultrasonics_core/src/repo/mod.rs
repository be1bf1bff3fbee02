//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one data access contract per stored concern.
//! - Isolate SQLite query details from the `Store` facade.
//!
//! # Invariants
//! - Writes encode caller values before any SQL mutation.
//! - Reads reject undecodable blobs with `MalformedRecord` instead of
//!   masking them.

pub mod applet_repo;
pub mod error;
pub mod install_repo;
pub mod plugin_repo;
pub mod settings_repo;
