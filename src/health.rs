//! Background health polling.
//!
//! [`HealthMonitor`] periodically checks whether ffmpeg can be found and
//! how many tracks the audio library holds, logs whenever either changes,
//! and keeps the most recent [`HealthSnapshot`] for callers to read.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use dr_av::{ToolRegistry, ToolsConfig};
use dr_pipeline::audio::library_tracks;

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub ffmpeg_available: bool,
    pub ffmpeg_path: Option<PathBuf>,
    pub audio_tracks: usize,
    pub checked_at: DateTime<Utc>,
}

impl HealthSnapshot {
    fn same_state(&self, other: &HealthSnapshot) -> bool {
        self.ffmpeg_available == other.ffmpeg_available
            && self.ffmpeg_path == other.ffmpeg_path
            && self.audio_tracks == other.audio_tracks
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polls tool availability and the audio library on a fixed interval.
///
/// The monitor is owned by its caller: nothing polls until
/// [`start`](Self::start) is called, and [`stop`](Self::stop) waits for the
/// polling task to exit.
pub struct HealthMonitor {
    probe: Arc<Probe>,
    latest: Arc<RwLock<Option<HealthSnapshot>>>,
    running: Mutex<Option<Running>>,
}

struct Probe {
    tools: ToolsConfig,
    audio_dir: PathBuf,
    extensions: Vec<String>,
}

impl Probe {
    fn check(&self) -> HealthSnapshot {
        let registry = ToolRegistry::discover(&self.tools);
        let ffmpeg_path = registry.require("ffmpeg").ok().map(|t| t.path.clone());
        HealthSnapshot {
            ffmpeg_available: ffmpeg_path.is_some(),
            ffmpeg_path,
            audio_tracks: library_tracks(&self.audio_dir, &self.extensions).len(),
            checked_at: Utc::now(),
        }
    }
}

impl HealthMonitor {
    pub fn new(tools: ToolsConfig, audio_dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            probe: Arc::new(Probe {
                tools,
                audio_dir: audio_dir.into(),
                extensions,
            }),
            latest: Arc::new(RwLock::new(None)),
            running: Mutex::new(None),
        }
    }

    /// Run one check immediately, without touching the published snapshot.
    pub fn check_now(&self) -> HealthSnapshot {
        self.probe.check()
    }

    /// The most recent snapshot published by the polling task.
    pub fn latest(&self) -> Option<HealthSnapshot> {
        self.latest.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawn the polling task. The first check runs immediately.
    ///
    /// Returns `false` without spawning if the monitor is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, interval: Duration) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let cancel = CancellationToken::new();
        let probe = self.probe.clone();
        let latest = self.latest.clone();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                "Health monitor started (every {:?}, library {})",
                interval,
                probe.audio_dir.display()
            );
            loop {
                let snapshot = probe.check();
                publish(&latest, snapshot);

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = task_cancel.cancelled() => { break; }
                }
            }
            tracing::info!("Health monitor stopped");
        });

        *running = Some(Running { cancel, handle });
        true
    }

    /// Cancel the polling task and wait for it to finish. No-op when not
    /// running.
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        if let Some(Running { cancel, handle }) = running {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::warn!("Health monitor task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

fn publish(latest: &RwLock<Option<HealthSnapshot>>, snapshot: HealthSnapshot) {
    let mut slot = latest.write();
    match slot.as_ref() {
        None => {
            tracing::info!(
                "Health: ffmpeg {}, {} audio track(s)",
                if snapshot.ffmpeg_available { "available" } else { "missing" },
                snapshot.audio_tracks
            );
        }
        Some(prev) if !prev.same_state(&snapshot) => {
            if prev.ffmpeg_available != snapshot.ffmpeg_available {
                if snapshot.ffmpeg_available {
                    tracing::info!("ffmpeg is now available");
                } else {
                    tracing::warn!("ffmpeg is no longer available");
                }
            }
            if prev.audio_tracks != snapshot.audio_tracks {
                tracing::info!(
                    "Audio library changed: {} -> {} track(s)",
                    prev.audio_tracks,
                    snapshot.audio_tracks
                );
            }
        }
        Some(_) => tracing::debug!("Health unchanged"),
    }
    *slot = Some(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(dir: &std::path::Path) -> HealthMonitor {
        HealthMonitor::new(ToolsConfig::default(), dir, vec!["mp3".to_string()])
    }

    async fn wait_for_tracks(monitor: &HealthMonitor, expected: usize) -> bool {
        for _ in 0..200 {
            if monitor.latest().is_some_and(|s| s.audio_tracks == expected) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn check_now_counts_tracks() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.mp3"), b"x").unwrap();
        std::fs::write(tmp.path().join("b.txt"), b"x").unwrap();

        let monitor = monitor(tmp.path());
        let snapshot = monitor.check_now();
        assert_eq!(snapshot.audio_tracks, 1);
        assert_eq!(snapshot.ffmpeg_available, snapshot.ffmpeg_path.is_some());
        assert!(monitor.latest().is_none());
    }

    #[tokio::test]
    async fn start_and_stop() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = monitor(tmp.path());
        assert!(!monitor.is_running());

        assert!(monitor.start(Duration::from_millis(10)));
        assert!(monitor.is_running());
        assert!(!monitor.start(Duration::from_millis(10)));

        assert!(wait_for_tracks(&monitor, 0).await);

        monitor.stop().await;
        assert!(!monitor.is_running());
        assert!(monitor.latest().is_some());

        // Restart after stop.
        assert!(monitor.start(Duration::from_millis(10)));
        monitor.stop().await;
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn picks_up_library_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = monitor(tmp.path());
        monitor.start(Duration::from_millis(10));
        assert!(wait_for_tracks(&monitor, 0).await);

        std::fs::write(tmp.path().join("song.mp3"), b"x").unwrap();
        assert!(wait_for_tracks(&monitor, 1).await);

        monitor.stop().await;
    }

    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = monitor(tmp.path());
        monitor.stop().await;
        assert!(!monitor.is_running());
    }
}
