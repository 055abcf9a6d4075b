//! Sound Resource Pool
//!
//! Loads the fixed catalog once, concurrently, and owns every handle for the
//! process lifetime. A failed or timed-out load marks only that entry nil;
//! the ready signal fires once every load has resolved either way.

use super::asset::{SoundAsset, SoundCategory};
use super::backend::SoundBackend;
use super::handle::SoundHandle;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Longest a single asset load may take before it counts as failed
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of [`SoundPool::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Entries with a playable handle
    pub loaded: usize,
    /// Entries with no source ("No Sound")
    pub silent: usize,
    /// Names of entries whose load failed (handle is nil)
    pub failed: Vec<String>,
}

struct PoolEntry {
    asset: SoundAsset,
    handle: SoundHandle,
}

/// Explicitly constructed, shared owner of all sound handles
pub struct SoundPool {
    backend: Arc<dyn SoundBackend>,
    entries: RwLock<Vec<PoolEntry>>,
    started: AtomicBool,
    disposed: AtomicBool,
    ready_tx: watch::Sender<bool>,
    load_timeout: Duration,
}

impl SoundPool {
    pub fn new(backend: Arc<dyn SoundBackend>) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            backend,
            entries: RwLock::new(Vec::new()),
            started: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            ready_tx,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Per-asset load time limit
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    /// Load every catalog entry concurrently and signal readiness.
    ///
    /// Only the first call loads anything; later calls log and return an
    /// empty report.
    pub async fn initialize(&self, catalog: Vec<SoundAsset>) -> PoolReport {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("Sound pool already initialized, ignoring");
            return PoolReport::default();
        }

        info!("Loading {} catalog entries", catalog.len());

        let load_timeout = self.load_timeout;
        let loads = catalog.into_iter().map(|asset| {
            let backend = Arc::clone(&self.backend);
            async move {
                if asset.is_silent() {
                    return (asset, Ok(None));
                }
                let load_asset = asset.clone();
                let mut task = tokio::task::spawn_blocking(move || backend.load(&load_asset));
                let voice = match tokio::time::timeout(load_timeout, &mut task).await {
                    Ok(Ok(Ok(voice))) => Ok(Some(voice)),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Err(join_err)) => Err(format!("load task failed: {}", join_err)),
                    Err(_) => {
                        // The blocking load cannot be interrupted; free whatever it yields
                        let name = asset.name.clone();
                        tokio::spawn(async move {
                            if let Ok(Ok(mut voice)) = task.await {
                                debug!("Releasing late load of '{}'", name);
                                voice.release();
                            }
                        });
                        Err(format!("load timed out after {:?}", load_timeout))
                    }
                };
                (asset, voice)
            }
        });

        let mut report = PoolReport::default();
        let mut entries = Vec::new();

        for (asset, outcome) in join_all(loads).await {
            let handle = match outcome {
                Ok(Some(voice)) => {
                    debug!("Loaded {} '{}'", asset.category, asset.name);
                    report.loaded += 1;
                    SoundHandle::spawn(&asset, voice)
                }
                Ok(None) => {
                    report.silent += 1;
                    SoundHandle::nil()
                }
                Err(e) => {
                    warn!("Failed to load {} '{}': {} (treated as No Sound)", asset.category, asset.name, e);
                    report.failed.push(asset.name.clone());
                    SoundHandle::nil()
                }
            };
            entries.push(PoolEntry { asset, handle });
        }

        // Checked under the lock: dispose flags first, then drains
        let orphaned = {
            let mut stored = self.entries.write().unwrap_or_else(|e| e.into_inner());
            if self.disposed.load(Ordering::SeqCst) {
                Some(entries)
            } else {
                *stored = entries;
                None
            }
        };
        if let Some(entries) = orphaned {
            warn!("Sound pool disposed during initialization, releasing loaded handles");
            for entry in &entries {
                entry.handle.release().await;
            }
        }
        self.ready_tx.send_replace(true);

        info!(
            "Sound pool ready: {} loaded, {} silent, {} failed",
            report.loaded,
            report.silent,
            report.failed.len()
        );
        report
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow() && !self.disposed.load(Ordering::SeqCst)
    }

    /// Wait until initialization has finished
    pub async fn ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // Sender lives as long as self, so this only returns once ready
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Handle for a catalog name, searching bells before ambiances.
    ///
    /// Unknown names, silent entries, failed loads, and any lookup before
    /// initialization completes all yield the nil handle.
    pub fn get(&self, name: &str) -> SoundHandle {
        self.lookup(|entry| entry.asset.name == name)
    }

    /// Handle for a catalog name within one category
    pub fn get_in(&self, category: SoundCategory, name: &str) -> SoundHandle {
        self.lookup(|entry| entry.asset.category == category && entry.asset.name == name)
    }

    /// Whether the catalog has an entry with this name in the category
    pub fn contains(&self, category: SoundCategory, name: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .any(|entry| entry.asset.category == category && entry.asset.name == name)
    }

    /// Catalog names of a category, in catalog order
    pub fn names(&self, category: SoundCategory) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|entry| entry.asset.category == category)
            .map(|entry| entry.asset.name.clone())
            .collect()
    }

    fn lookup(&self, matches: impl Fn(&PoolEntry) -> bool) -> SoundHandle {
        if self.disposed.load(Ordering::SeqCst) {
            return SoundHandle::nil();
        }
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<&PoolEntry> = entries.iter().filter(|entry| matches(entry)).collect();
        found.sort_by_key(|entry| entry.asset.category != SoundCategory::Bell);
        found
            .first()
            .map(|entry| entry.handle.clone())
            .unwrap_or_default()
    }

    /// Release every handle exactly once. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            debug!("Sound pool already disposed");
            return;
        }

        let handles: Vec<SoundHandle> = {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
            entries.drain(..).map(|entry| entry.handle).collect()
        };

        for handle in &handles {
            handle.release().await;
        }
        info!("Sound pool disposed ({} handles)", handles.len());
    }
}
