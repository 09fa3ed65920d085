//! Debounces a burst of `ModuleChanged` events into one batch (spec §4.9:
//! "default window ~300ms, configurable").

use antelope_watch::ModuleChanged;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Waits for the next event, then keeps collecting for as long as new
/// events keep arriving within `window` of the last one. Returns `None`
/// once the channel is closed and empty.
pub async fn next_batch(rx: &mut UnboundedReceiver<ModuleChanged>, window: Duration) -> Option<HashSet<antelope_core::ModuleId>> {
    let first = rx.recv().await?;
    let mut batch = HashSet::new();
    batch.insert(first.0);

    loop {
        match timeout(window, rx.recv()).await {
            Ok(Some(ModuleChanged(id))) => {
                batch.insert(id);
            }
            Ok(None) | Err(_) => break,
        }
    }
    Some(batch)
}
