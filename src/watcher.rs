/*!
 * Polling watcher for new video files.
 *
 * New files are only handed over once their size has stopped changing, so a
 * file still being copied into the library is not scanned half-written. A file
 * is handed over at most once per watch, whether its scan succeeds or not.
 */

use anyhow::Result;
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::WatchConfig;
use crate::file_utils::FileFilter;
use crate::scanner::{ScanStore, Scanner};

#[derive(Debug, Clone, Copy)]
struct Observation {
    size: u64,
    checked_at: Instant,
}

/// Tracks the size of new files until it stops changing
#[derive(Debug)]
pub struct SettledFileTracker {
    settle_interval: Duration,
    pending: HashMap<PathBuf, Observation>,
    /// Files already handed over or ignored
    done: HashSet<PathBuf>,
}

impl SettledFileTracker {
    pub fn new(settle_interval: Duration) -> Self {
        Self {
            settle_interval,
            pending: HashMap::new(),
            done: HashSet::new(),
        }
    }

    /// Start tracking `path` unless it is already tracked or done
    pub fn observe(&mut self, path: PathBuf, size: u64, now: Instant) {
        if self.done.contains(&path) {
            return;
        }
        self.pending.entry(path).or_insert(Observation { size, checked_at: now });
    }

    /// Never track `path`
    pub fn ignore(&mut self, path: PathBuf) {
        self.pending.remove(&path);
        self.done.insert(path);
    }

    pub fn is_tracking(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }

    /// Tracked now or handed over before
    pub fn is_known(&self, path: &Path) -> bool {
        self.is_tracking(path) || self.done.contains(path)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Re-check tracked files with `size_of` and return those that settled.
    ///
    /// `size_of` returns `None` for files that disappeared; they are dropped.
    pub fn check<F>(&mut self, now: Instant, mut size_of: F) -> Vec<PathBuf>
    where
        F: FnMut(&Path) -> Option<u64>,
    {
        let settle_interval = self.settle_interval;
        let mut settled: Vec<PathBuf> = Vec::new();

        self.pending.retain(|path, observation| {
            if now.duration_since(observation.checked_at) < settle_interval {
                return true;
            }

            match size_of(path) {
                None => {
                    debug!("File disappeared: {:?}", path);
                    false
                }
                Some(size) if size == observation.size => {
                    settled.push(path.clone());
                    false
                }
                Some(size) => {
                    debug!("File still growing: {:?} ({} -> {} bytes)", path, observation.size, size);
                    *observation = Observation { size, checked_at: now };
                    true
                }
            }
        });

        settled.sort();
        self.done.extend(settled.iter().cloned());
        settled
    }
}

/// SIGINT and SIGTERM (Ctrl-C outside Unix), registered once
struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ShutdownSignals {
    fn new() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }
        #[cfg(windows)]
        {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c()?,
            })
        }
    }

    /// Wait for the next shutdown signal and return its name
    async fn recv(&mut self) -> &'static str {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => "SIGINT",
                _ = self.terminate.recv() => "SIGTERM",
            }
        }
        #[cfg(windows)]
        {
            self.ctrl_c.recv().await;
            "Ctrl-C"
        }
    }
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

/// Poll `target` for new unscanned files and hand settled ones to `on_settled`.
///
/// `handled` are files already scanned by the caller; they are never handed
/// over. Runs until SIGINT or SIGTERM.
pub async fn watch<S, F, Fut>(
    target: &Path,
    filter: FileFilter,
    store: &S,
    config: &WatchConfig,
    handled: Vec<PathBuf>,
    mut on_settled: F,
) -> Result<()>
where
    S: ScanStore + ?Sized,
    F: FnMut(Vec<PathBuf>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let scanner = Scanner::new(filter);
    let mut tracker = SettledFileTracker::new(Duration::from_secs(config.settle_interval_secs));
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs.max(1)));
    let mut signals = ShutdownSignals::new()?;

    for path in handled {
        tracker.ignore(path);
    }

    info!("Watching {:?} for new files, press Ctrl-C to stop", target);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            signal = signals.recv() => {
                info!("Received {}, stopping watcher", signal);
                return Ok(());
            }
        }

        let now = Instant::now();
        match scanner.collect(target, store).await {
            Ok(files) => {
                for path in files {
                    if tracker.is_known(&path) {
                        continue;
                    }
                    if let Some(size) = file_size(&path) {
                        debug!("New file: {:?}", path);
                        tracker.observe(path, size, now);
                    }
                }
            }
            Err(e) => error!("Failed to list {:?}: {}", target, e),
        }

        let settled = tracker.check(now, file_size);
        if !settled.is_empty() {
            info!("{} new files ready", settled.len());
            if let Err(e) = on_settled(settled).await {
                error!("Processing new files failed: {}", e);
            }
        }
    }
}
