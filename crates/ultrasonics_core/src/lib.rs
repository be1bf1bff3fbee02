//! Persistence layer for ultrasonics plugins and applets.
//! This crate owns install state, global settings, versioned plugin settings
//! and applet plans on top of a single SQLite file.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::{
    decode, decode_optional, encode, CodecError, CodecResult, CODEC_FORMAT, MAX_NESTING_DEPTH,
};
pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::applet::{AppletId, AppletRecord};
pub use model::plugin::{normalize_plugin_version, PluginRecord, VersionLookup};
pub use model::settings::{
    default_global_settings, BuiltinDefaults, ConfigurableSetting, InstallDefaults,
    ProcessMetadata, SettingDescriptor, SettingKind, SettingsSchema,
};
pub use model::value::{Value, ValueMap};
pub use repo::error::{StoreError, StoreResult};
pub use repo::install_repo::{InitOutcome, InstallState};
pub use service::store::Store;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
