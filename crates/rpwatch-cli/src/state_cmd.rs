//! `rpwatch state show|reset`.

use std::path::Path;

use anyhow::Context as _;
use rpwatch_watcher::StateStore;

pub(crate) fn show(path: &Path) -> anyhow::Result<()> {
    let store = StateStore::new(path);
    let state = store
        .try_load()
        .with_context(|| format!("state file {} is unreadable", path.display()))?;

    match state.last_seen_reference.as_deref() {
        Some(_) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("no reference recorded at {}", path.display()),
    }
    Ok(())
}

pub(crate) fn reset(path: &Path) -> anyhow::Result<()> {
    let store = StateStore::new(path);
    if store.reset()? {
        println!("removed {}; the next cycle records a new baseline", path.display());
    } else {
        println!("nothing to reset at {}", path.display());
    }
    Ok(())
}
