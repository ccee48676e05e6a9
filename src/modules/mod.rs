pub mod catalog;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use libris_catalog::{Catalog, JsonFileStore};
use libris_kernel::settings::Settings;
use libris_kernel::ModuleRegistry;

/// Open the catalog store and register all application modules.
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&settings.storage.path);
    let catalog = Catalog::load(Box::new(store))
        .with_context(|| format!("failed to open catalog store at {}", settings.storage.path))?;
    tracing::info!(
        books = catalog.len(),
        path = %settings.storage.path,
        "catalog store opened"
    );

    registry.register(catalog::create_module(
        Arc::new(Mutex::new(catalog)),
        settings,
    ));
    Ok(())
}
