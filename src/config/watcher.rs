use anyhow::Result;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;
use tracing::{error, info, warn};

/// Quiet period after the last filesystem event before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the config file and definition directories and calls
/// `on_change` once per burst of edits. Dropping it stops the watch.
pub struct DefinitionWatcher {
    _watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
}

impl DefinitionWatcher {
    pub fn new<F>(paths: Vec<PathBuf>, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        let mut watched = Vec::new();
        for path in paths {
            if path.exists() {
                watcher.watch(&path, RecursiveMode::Recursive)?;
                info!("Watching definitions path: {}", path.display());
                watched.push(path);
            } else {
                warn!("Definitions path does not exist, skipping: {}", path.display());
            }
        }

        std::thread::spawn(move || loop {
            match rx.recv() {
                Ok(Ok(_event)) => {
                    // Editors emit several events per save; wait for them to settle.
                    loop {
                        match rx.recv_timeout(DEBOUNCE) {
                            Ok(Ok(_)) => continue,
                            Ok(Err(e)) => error!("Watch error: {:?}", e),
                            Err(RecvTimeoutError::Timeout) => break,
                            Err(RecvTimeoutError::Disconnected) => return,
                        }
                    }
                    info!("Definition change detected, reloading...");
                    on_change();
                }
                Ok(Err(e)) => error!("Watch error: {:?}", e),
                Err(_) => break,
            }
        });

        Ok(Self {
            _watcher: watcher,
            watched,
        })
    }

    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched
    }
}
