//! Age-based scratch cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use walkdir::WalkDir;

/// Counts from one purge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub removed: usize,
    pub retained: usize,
    pub failed: usize,
}

/// Deletes scratch files whose modification time is older than a
/// retention window, across one or more directories.
///
/// Purging never fails: per-file errors (vanished files, permission
/// problems, concurrent deletions by another run) are counted and logged
/// at debug level only.
#[derive(Debug, Clone)]
pub struct TempJanitor {
    dirs: Vec<PathBuf>,
}

impl TempJanitor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dirs: vec![dir.into()],
        }
    }

    /// Also purge `dir`.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Remove every regular file under the scratch directories older than
    /// `retention`. Missing directories are skipped.
    pub fn purge(&self, retention: Duration) -> PurgeSummary {
        let mut summary = PurgeSummary::default();
        let now = SystemTime::now();
        for dir in &self.dirs {
            purge_dir(dir, now, retention, &mut summary);
        }

        if summary.removed > 0 || summary.failed > 0 {
            tracing::info!(
                "Purged {} stale scratch file(s) ({} kept, {} failed)",
                summary.removed,
                summary.retained,
                summary.failed
            );
        }
        summary
    }

    /// A guard that purges with `retention` when dropped.
    pub fn guard(&self, retention: Duration) -> PurgeGuard {
        PurgeGuard {
            janitor: self.clone(),
            retention,
        }
    }
}

fn purge_dir(dir: &Path, now: SystemTime, retention: Duration, summary: &mut PurgeSummary) {
    if !dir.is_dir() {
        return;
    }
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!("janitor: skipping unreadable entry: {e}");
                summary.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let age = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok());

        match age {
            Some(age) if age > retention => match std::fs::remove_file(entry.path()) {
                Ok(()) => {
                    tracing::debug!("janitor: removed {}", entry.path().display());
                    summary.removed += 1;
                }
                Err(e) => {
                    tracing::debug!(
                        "janitor: failed to remove {}: {e}",
                        entry.path().display()
                    );
                    summary.failed += 1;
                }
            },
            // Unknown age or a modification time in the future: keep.
            _ => summary.retained += 1,
        }
    }
}

/// Runs [`TempJanitor::purge`] on drop, so cleanup happens on every exit
/// path of the scope that holds it.
#[derive(Debug)]
pub struct PurgeGuard {
    janitor: TempJanitor,
    retention: Duration,
}

impl Drop for PurgeGuard {
    fn drop(&mut self) {
        self.janitor.purge(self.retention);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    const HOUR: Duration = Duration::from_secs(3600);

    fn aged_file(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"scratch").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn removes_old_and_keeps_recent() {
        let tmp = tempfile::tempdir().unwrap();
        let old = aged_file(tmp.path(), "old.txt", 25 * HOUR);
        let fresh = aged_file(tmp.path(), "fresh.txt", HOUR);

        let summary = TempJanitor::new(tmp.path()).purge(24 * HOUR);

        assert!(!old.exists());
        assert!(fresh.exists());
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.retained, 1);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn descends_into_subdirectories_but_keeps_them() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("nested");
        fs::create_dir(&sub).unwrap();
        let old = aged_file(&sub, "tone.wav", 48 * HOUR);

        TempJanitor::new(tmp.path()).purge(24 * HOUR);

        assert!(!old.exists());
        assert!(sub.is_dir());
    }

    #[test]
    fn missing_directory_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let summary = TempJanitor::new(tmp.path().join("absent")).purge(HOUR);
        assert_eq!(summary, PurgeSummary::default());
    }

    #[test]
    fn purge_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        aged_file(tmp.path(), "old.txt", 30 * HOUR);
        let janitor = TempJanitor::new(tmp.path());
        assert_eq!(janitor.purge(24 * HOUR).removed, 1);
        assert_eq!(janitor.purge(24 * HOUR).removed, 0);
    }

    #[test]
    fn purges_every_registered_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let scratch = tmp.path().join("temp");
        let banners = tmp.path().join("banners");
        fs::create_dir_all(&scratch).unwrap();
        fs::create_dir_all(&banners).unwrap();
        let old_clip = aged_file(&scratch, "clip.mp4", 30 * HOUR);
        let old_banner = aged_file(&banners, "banner.png", 30 * HOUR);
        let new_banner = aged_file(&banners, "fresh.png", HOUR);

        let janitor = TempJanitor::new(&scratch)
            .with_dir(&banners)
            .with_dir(tmp.path().join("absent"));
        let summary = janitor.purge(24 * HOUR);

        assert!(!old_clip.exists());
        assert!(!old_banner.exists());
        assert!(new_banner.exists());
        assert_eq!(summary.removed, 2);
        assert_eq!(summary.retained, 1);
    }

    #[test]
    fn guard_purges_on_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let old = aged_file(tmp.path(), "list.txt", 25 * HOUR);
        {
            let _guard = TempJanitor::new(tmp.path()).guard(24 * HOUR);
            assert!(old.exists());
        }
        assert!(!old.exists());
    }
}
