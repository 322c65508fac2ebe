use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{PendingReload, ShaderMonitor, is_shader_source};
use crate::settings::HotReloadConfig;
use crate::shader::{BuiltinShaders, ShaderProfile};

const WINDOW: Duration = Duration::from_millis(100);

#[test]
fn first_edit_sets_deadline() {
    let pending = PendingReload::new();
    let t0 = Instant::now();
    assert!(pending.schedule(t0, WINDOW));
    assert!(pending.is_pending());
}

#[test]
fn later_edits_are_coalesced() {
    let pending = PendingReload::new();
    let t0 = Instant::now();
    assert!(pending.schedule(t0, WINDOW));
    assert!(!pending.schedule(t0 + Duration::from_millis(50), WINDOW));

    // The deadline stays at the first edit's window.
    assert!(!pending.take_expired(t0 + Duration::from_millis(99)));
    assert!(pending.take_expired(t0 + Duration::from_millis(100)));
}

#[test]
fn expired_deadline_is_taken_once() {
    let pending = PendingReload::new();
    let t0 = Instant::now();
    pending.schedule(t0, WINDOW);
    let later = t0 + Duration::from_secs(1);
    assert!(pending.take_expired(later));
    assert!(!pending.take_expired(later));
    assert!(!pending.is_pending());
}

#[test]
fn nothing_pending_is_never_expired() {
    let pending = PendingReload::new();
    assert!(!pending.take_expired(Instant::now() + Duration::from_secs(60)));
}

#[test]
fn edit_after_reload_starts_new_window() {
    let pending = PendingReload::new();
    let t0 = Instant::now();
    pending.schedule(t0, WINDOW);
    assert!(pending.take_expired(t0 + WINDOW));

    let t1 = t0 + Duration::from_secs(1);
    assert!(pending.schedule(t1, WINDOW));
    assert!(!pending.take_expired(t1));
    assert!(pending.take_expired(t1 + WINDOW));
}

#[test]
fn concurrent_edits_set_exactly_one_deadline() {
    let pending = Arc::new(PendingReload::new());
    let winners = Arc::new(AtomicUsize::new(0));
    let now = Instant::now();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pending = Arc::clone(&pending);
            let winners = Arc::clone(&winners);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if pending.schedule(now, WINDOW) {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("edit thread");
    }

    assert_eq!(winners.load(Ordering::Relaxed), 1);
    assert!(pending.take_expired(now + WINDOW));
    assert!(!pending.take_expired(now + WINDOW));
}

#[test]
fn only_wgsl_files_trigger() {
    assert!(is_shader_source(Path::new("/x/quad.wgsl")));
    assert!(!is_shader_source(Path::new("/x/quad.wgsl.swp")));
    assert!(!is_shader_source(Path::new("/x/notes.txt")));
}

#[test]
fn missing_shader_dir_fails_to_watch() {
    let config = HotReloadConfig {
        enabled: true,
        shader_dir: Some("/nonexistent/oriterm_atlas/shaders".into()),
        ..HotReloadConfig::default()
    };
    let live = BuiltinShaders::embedded(ShaderProfile::Full).expect("compile");
    assert!(ShaderMonitor::new(&config, live).is_err());
}
