use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use super::core::MetadataRegistry;

static GLOBAL_REGISTRY: Lazy<ArcSwap<MetadataRegistry>> =
    Lazy::new(|| ArcSwap::from_pointee(MetadataRegistry::new()));

// Writers clone, mutate, then swap; the lock keeps concurrent writers from losing entries.
static WRITE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Snapshot of the process-wide registry.
#[must_use]
pub fn global() -> Arc<MetadataRegistry> {
    GLOBAL_REGISTRY.load_full()
}

/// Apply definitions to the process-wide registry.
///
/// Nothing is published when `define` fails, so a half-declared model never becomes
/// visible to readers.
pub fn register_global<F, E>(define: F) -> Result<(), E>
where
    F: FnOnce(&mut MetadataRegistry) -> Result<(), E>,
{
    let _guard = WRITE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut next = MetadataRegistry::clone(&GLOBAL_REGISTRY.load());
    define(&mut next)?;
    GLOBAL_REGISTRY.store(Arc::new(next));
    Ok(())
}
