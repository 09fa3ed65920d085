use antelope_core::{ContentHash, ModuleId};
use dashmap::DashMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

const EXCLUDED_DIR_NAMES: [&str; 2] = [".git", "node_modules"];

/// Emitted when a watched file's content hash differs from what was last
/// recorded, or the file was removed (spec §4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChanged(pub ModuleId);

#[derive(Default)]
struct Shared {
    /// Scanned directory -> owning module.
    dir_owner: DashMap<PathBuf, ModuleId>,
    /// Last-known content hash per file, for change detection.
    hashes: DashMap<PathBuf, ContentHash>,
    /// Directories registered per module, so `unwatch_module` can tear them
    /// down without rescanning the tree.
    module_dirs: DashMap<ModuleId, Vec<PathBuf>>,
}

/// Watches each module's declared source directories for content changes.
///
/// Raw file-system events are funneled through an internal channel and
/// turned into `ModuleChanged` notifications by a background task, keeping
/// the `notify` callback itself cheap.
pub struct WatchEngine {
    watcher: parking_lot::Mutex<RecommendedWatcher>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEngine")
            .field("watched_dirs", &self.shared.dir_owner.len())
            .finish()
    }
}

impl WatchEngine {
    /// # Errors
    /// Returns an error if the underlying OS watcher cannot be created.
    pub fn new() -> notify::Result<(Self, UnboundedReceiver<ModuleChanged>)> {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<Event>();
        let (tx, rx) = mpsc::unbounded_channel::<ModuleChanged>();
        let shared = Arc::new(Shared::default());

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_relevant(&event.kind) => {
                let _ = raw_tx.send(event);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "file watcher error"),
        })?;

        tokio::spawn(process_events(shared.clone(), raw_rx, tx));

        Ok((
            Self {
                watcher: parking_lot::Mutex::new(watcher),
                shared,
            },
            rx,
        ))
    }

    /// Recursively scans `roots` (skipping `.git` and `node_modules`),
    /// hashes every file found, and installs a watcher on every scanned
    /// directory, all attributed to `id`.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be watched.
    pub fn watch_module(&self, id: &ModuleId, roots: &[PathBuf]) -> notify::Result<()> {
        let mut dirs = Vec::new();
        for root in roots {
            for entry in walkdir::WalkDir::new(root)
                .into_iter()
                .filter_entry(|e| !is_excluded(e))
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if entry.file_type().is_dir() {
                    self.shared.dir_owner.insert(path.to_path_buf(), id.clone());
                    self.watcher.lock().watch(path, RecursiveMode::NonRecursive)?;
                    dirs.push(path.to_path_buf());
                } else if let Ok(hash) = ContentHash::of_file(path) {
                    self.shared.hashes.insert(path.to_path_buf(), hash);
                }
            }
        }
        debug!(module = %id, dirs = dirs.len(), "watching module source");
        self.shared.module_dirs.insert(id.clone(), dirs);
        Ok(())
    }

    /// Stops watching every directory registered for `id` and forgets its
    /// recorded file hashes.
    pub fn unwatch_module(&self, id: &ModuleId) {
        let Some((_, dirs)) = self.shared.module_dirs.remove(id) else {
            return;
        };
        let mut watcher = self.watcher.lock();
        for dir in &dirs {
            let _ = watcher.unwatch(dir);
            self.shared.dir_owner.remove(dir);
            self.shared.hashes.retain(|path, _| !path.starts_with(dir));
        }
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| EXCLUDED_DIR_NAMES.contains(&name))
}

/// Walks `path`'s ancestors until one matches a scanned directory.
fn find_owner(dir_owner: &DashMap<PathBuf, ModuleId>, path: &Path) -> Option<ModuleId> {
    path.ancestors().find_map(|ancestor| dir_owner.get(ancestor).map(|e| e.value().clone()))
}

async fn process_events(shared: Arc<Shared>, mut raw_rx: UnboundedReceiver<Event>, tx: UnboundedSender<ModuleChanged>) {
    while let Some(event) = raw_rx.recv().await {
        for path in event.paths {
            let Some(owner) = find_owner(&shared.dir_owner, &path) else {
                continue;
            };

            let changed = match ContentHash::of_file(&path) {
                Ok(hash) => {
                    let prior = shared.hashes.insert(path.clone(), hash);
                    prior != Some(hash)
                }
                Err(_) => shared.hashes.remove(&path).is_some(),
            };

            if changed {
                debug!(module = %owner, path = %path.display(), "module source changed");
                if tx.send(ModuleChanged(owner)).is_err() {
                    return;
                }
            }
        }
    }
}
