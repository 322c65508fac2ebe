//! Debug-build reloading of the built-in WGSL shaders.
//!
//! A file watcher callback runs on notify's thread and records the first
//! edit of a burst as a deadline in a single atomic. The render thread
//! checks that deadline once per frame; once it has passed, every built-in
//! shader is recompiled from disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::builtin::BuiltinShaders;
use super::compile::ShaderProfile;
use crate::error::ShaderError;
use crate::settings::HotReloadConfig;

/// Sentinel for "no reload pending".
const NO_DEADLINE: u64 = u64::MAX;

/// Single-slot reload deadline, in nanoseconds since `epoch`.
#[derive(Debug)]
pub struct PendingReload {
    epoch: Instant,
    deadline: AtomicU64,
}

impl Default for PendingReload {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingReload {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            deadline: AtomicU64::new(NO_DEADLINE),
        }
    }

    /// Record an edit at `now`. Only the first edit while no reload is
    /// pending sets the deadline; later ones are coalesced into it.
    ///
    /// Returns whether this call set the deadline.
    pub fn schedule(&self, now: Instant, debounce: Duration) -> bool {
        let deadline = self
            .nanos(now)
            .saturating_add(debounce.as_nanos() as u64)
            .min(NO_DEADLINE - 1);
        self.deadline
            .compare_exchange(NO_DEADLINE, deadline, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the pending reload if its deadline has passed.
    pub fn take_expired(&self, now: Instant) -> bool {
        let deadline = self.deadline.load(Ordering::Acquire);
        if deadline == NO_DEADLINE || self.nanos(now) < deadline {
            return false;
        }
        self.deadline
            .compare_exchange(deadline, NO_DEADLINE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.load(Ordering::Acquire) != NO_DEADLINE
    }

    fn nanos(&self, t: Instant) -> u64 {
        t.saturating_duration_since(self.epoch).as_nanos() as u64
    }
}

fn is_shader_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "wgsl")
}

/// Watches the built-in shader directory and holds the live built-ins.
pub struct ShaderMonitor {
    dir: PathBuf,
    pending: Arc<PendingReload>,
    live: BuiltinShaders,
    _watcher: RecommendedWatcher,
}

impl ShaderMonitor {
    pub fn new(config: &HotReloadConfig, live: BuiltinShaders) -> notify::Result<Self> {
        let dir = config.shader_dir();
        let debounce = Duration::from_millis(config.debounce_ms);
        let pending = Arc::new(PendingReload::new());

        let sink = Arc::clone(&pending);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            if event.paths.iter().any(|p| is_shader_source(p)) {
                sink.schedule(Instant::now(), debounce);
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        log::info!("shader hot reload: watching {}", dir.display());

        Ok(Self {
            dir,
            pending,
            live,
            _watcher: watcher,
        })
    }

    /// Recompile the built-ins if an edit's debounce window has elapsed.
    ///
    /// `None` means nothing to do. On `Some(Err(_))` the live shaders are
    /// left untouched.
    pub fn poll(&mut self, profile: ShaderProfile) -> Option<Result<&BuiltinShaders, ShaderError>> {
        if !self.pending.take_expired(Instant::now()) {
            return None;
        }
        log::debug!("shader hot reload: recompiling from {}", self.dir.display());
        match self.live.load_dir(&self.dir, profile) {
            Ok(next) => {
                self.live = next;
                Some(Ok(&self.live))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests;
