//! File watcher for re-rendering sketches on save

use anyhow::{Result, anyhow};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, channel};
use std::time::Duration;

/// Event emitted when a watched sketch changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A watched sketch was written, replaced or removed
    Changed(PathBuf),
    /// The watcher reported an error
    Error(String),
}

/// Watches sketch files for changes
///
/// The parent directory is watched rather than the file itself, because
/// editors that save by renaming a temp file would otherwise drop the watch.
pub struct SketchWatcher {
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<WatchEvent>,
    watched: Arc<Mutex<Vec<PathBuf>>>,
}

impl SketchWatcher {
    /// Create a watcher that coalesces events within `debounce`
    pub fn new(debounce: Duration) -> Result<Self> {
        let (tx, rx) = channel();
        let watched: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));
        let watched_clone = Arc::clone(&watched);

        let debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let watched = watched_clone.lock();
                    for event in events {
                        if watched.iter().any(|p| *p == event.path) {
                            let _ = tx.send(WatchEvent::Changed(event.path));
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("Watch error: {:?}", e)));
                }
            },
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {:?}", e))?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched,
        })
    }

    /// Start watching a sketch file
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|e| anyhow!("Failed to watch {}: {}", path.display(), e))?;
        let dir = canonical
            .parent()
            .ok_or_else(|| anyhow!("{} has no parent directory", canonical.display()))?
            .to_path_buf();

        {
            let mut watched = self.watched.lock();
            if !watched.contains(&canonical) {
                watched.push(canonical.clone());
            }
        }

        self.debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {}: {}", dir.display(), e))?;

        tracing::info!("Watching: {}", canonical.display());
        Ok(())
    }

    /// Wait up to `timeout` for the next event
    ///
    /// `Ok(None)` means the timeout passed; an error means the watcher is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WatchEvent>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(anyhow!("File watcher stopped")),
        }
    }

    /// Drop any events already queued
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_creation() {
        assert!(SketchWatcher::new(Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn test_watch_nonexistent() {
        let mut watcher = SketchWatcher::new(Duration::from_millis(50)).unwrap();
        assert!(watcher.watch("/nonexistent/path/sketch.js").is_err());
    }

    #[test]
    fn test_watch_existing_file() {
        let path = std::env::temp_dir().join("phena_watch_test.js");
        std::fs::write(&path, "point(0, 0);").unwrap();

        let mut watcher = SketchWatcher::new(Duration::from_millis(50)).unwrap();
        assert!(watcher.watch(&path).is_ok());
        assert!(watcher.recv_timeout(Duration::from_millis(1)).is_ok());

        std::fs::remove_file(&path).ok();
    }
}
