//! Caller-facing services.
//!
//! # Responsibility
//! - Wrap repositories behind one process-wide `Store` handle.
//! - Keep callers (plugin host, scheduler, web handlers) decoupled from SQL.

pub mod store;
