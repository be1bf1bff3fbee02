//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the store (path from `ULTRASONICS_DB_PATH` or the first argument,
//!   `:memory:` for a throwaway database), seed it and print a summary.
//! - Keep output deterministic for quick local sanity checks.

use std::collections::BTreeSet;
use std::process::ExitCode;
use ultrasonics_core::{
    core_version, default_global_settings, BuiltinDefaults, Store, StoreConfig, StoreResult,
    VersionLookup,
};

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ultrasonics_core error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(path_arg: Option<String>) -> StoreResult<()> {
    let store = match path_arg.as_deref() {
        Some(":memory:") => Store::open_in_memory()?,
        Some(path) => Store::open(&StoreConfig::with_path(path))?,
        None => Store::open(&StoreConfig::from_env())?,
    };

    println!("ultrasonics_core version={}", core_version());
    let outcome = store.bootstrap(&BuiltinDefaults::new(core_version()))?;
    println!("install outcome={outcome:?}");
    println!("install state={:?}", store.is_new_install()?);

    let schema = default_global_settings();
    for setting in store.load_settings(&schema)?.configurable() {
        println!("setting {}={}", setting.name, setting.value);
    }

    let names: BTreeSet<String> = store
        .list_plugins()?
        .into_iter()
        .map(|plugin| plugin.name)
        .collect();
    for name in names {
        let versions = match store.find_plugin_versions(&name)? {
            VersionLookup::Found(versions) => versions.join(","),
            VersionLookup::Missing => String::new(),
        };
        println!("plugin {name} versions={versions}");
    }

    for applet in store.list_applets()? {
        println!(
            "applet {} last_run={}",
            applet.id,
            if applet.last_run.is_some() { "yes" } else { "no" }
        );
    }

    Ok(())
}
