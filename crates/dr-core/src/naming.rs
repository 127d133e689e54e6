//! Artifact file naming.
//!
//! Every file the pipeline writes is named
//! `<kind>_<YYYYMMDD_HHMMSS>_<id>.<ext>`. The timestamp keeps directory
//! listings chronological; the id is drawn from a v4 UUID so concurrent
//! runs sharing an output directory do not collide in practice.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Hex characters of the UUID kept in the file name.
const ID_LEN: usize = 12;

/// What kind of artifact a file holds; determines prefix and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Banner,
    Clip,
    Concat,
    ConcatList,
    Tone,
    Music,
    Compressed,
}

impl ArtifactKind {
    /// File name prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Clip => "clip",
            Self::Concat => "concat",
            Self::ConcatList => "concat_list",
            Self::Tone => "tone",
            Self::Music => "music",
            Self::Compressed => "compressed",
        }
    }

    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Banner => "png",
            Self::ConcatList => "txt",
            Self::Tone => "wav",
            Self::Clip | Self::Concat | Self::Music | Self::Compressed => "mp4",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A generated, collision-resistant artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    kind: ArtifactKind,
    stamp: String,
    id: String,
}

impl ArtifactName {
    /// Generate a fresh name for `kind` stamped with the current local time.
    pub fn new(kind: ArtifactKind) -> Self {
        Self::at(kind, Local::now())
    }

    /// Generate a fresh name with an explicit timestamp.
    pub fn at(kind: ArtifactKind, when: DateTime<Local>) -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        Self {
            kind,
            stamp: when.format("%Y%m%d_%H%M%S").to_string(),
            id,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// The unique id portion of the name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full file name including extension.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.kind.prefix(),
            self.stamp,
            self.id,
            self.kind.extension()
        )
    }

    /// Join the file name onto `dir`.
    pub fn in_dir(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_layout() {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = ArtifactName::at(ArtifactKind::Clip, when);
        let file = name.file_name();
        assert!(file.starts_with("clip_20240309_140507_"), "got {file}");
        assert!(file.ends_with(".mp4"));
        assert_eq!(name.id().len(), ID_LEN);
        assert!(name.id().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn names_are_unique_within_one_second() {
        let when = Local::now();
        let a = ArtifactName::at(ArtifactKind::Banner, when);
        let b = ArtifactName::at(ArtifactKind::Banner, when);
        assert_ne!(a.file_name(), b.file_name());
    }

    #[test]
    fn extensions_per_kind() {
        assert_eq!(ArtifactKind::Banner.extension(), "png");
        assert_eq!(ArtifactKind::ConcatList.extension(), "txt");
        assert_eq!(ArtifactKind::Tone.extension(), "wav");
        assert_eq!(ArtifactKind::Compressed.extension(), "mp4");
    }

    #[test]
    fn in_dir_joins_path() {
        let name = ArtifactName::new(ArtifactKind::Tone);
        let path = name.in_dir(Path::new("/tmp/scratch"));
        assert!(path.starts_with("/tmp/scratch"));
        assert_eq!(path.file_name().unwrap().to_string_lossy(), name.file_name());
    }
}
