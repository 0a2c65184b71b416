//! Reload trigger for the viewer: reports when the open document changes on disk.

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use log::debug;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

pub struct DocumentWatcher {
    changes: mpsc::Receiver<()>,
    _watcher: RecommendedWatcher, // dropping it stops the watch
}

impl DocumentWatcher {
    /// Watch `path` for content changes.
    ///
    /// Editors that save by writing a temp file and renaming it over the
    /// original replace the inode, so the parent directory is watched and
    /// events are filtered down to the document itself.
    pub fn new(path: &Path) -> Result<Self> {
        let target = path
            .canonicalize()
            .with_context(|| format!("cannot watch {}", path.display()))?;
        let dir: PathBuf = target
            .parent()
            .ok_or_else(|| anyhow::anyhow!("cannot watch root path"))?
            .to_path_buf();
        let (tx, changes) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let Ok(event) = res else { return };
                let touches_doc = event.paths.iter().any(|p| p == &target);
                let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                if touches_doc && relevant {
                    let _ = tx.send(());
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("watch: {} (via {})", path.display(), dir.display());

        Ok(Self { changes, _watcher: watcher })
    }

    /// Non-blocking; a burst of queued notifications reads as one change.
    pub fn poll_changed(&self) -> bool {
        self.changes.try_iter().count() > 0
    }
}
