//! Domain model for the persistence layer.
//!
//! # Responsibility
//! - Define caller-facing records for settings, plugins and applets.
//! - Keep encoded storage details out of public types.
//!
//! # Invariants
//! - Values crossing the store boundary are owned copies, never shared with
//!   stored bytes.

pub mod applet;
pub mod plugin;
pub mod settings;
pub mod value;
