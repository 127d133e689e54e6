//! Stream-copy concatenation through ffmpeg's concat demuxer.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use dr_core::Error;

use super::run_to_file;
use crate::invocation::ConcatList;
use crate::tools::ToolRegistry;

/// Write a concat-demuxer list: one `file '<path>'` line per clip, in order.
///
/// Relative paths are made absolute, since the demuxer resolves them
/// against the list's own directory. Paths containing `'` are rejected.
pub fn write_concat_list(list_file: &Path, clips: &[PathBuf]) -> dr_core::Result<()> {
    if clips.is_empty() {
        return Err(Error::Validation("no clips to concatenate".into()));
    }

    let mut body = String::new();
    for clip in clips {
        let resolved = clip.canonicalize().unwrap_or_else(|_| clip.clone());
        let s = resolved.to_string_lossy();
        if s.contains('\'') {
            return Err(Error::Validation(format!(
                "clip path '{}' contains a single quote",
                clip.display()
            )));
        }
        let _ = writeln!(body, "file '{s}'");
    }

    if let Some(parent) = list_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(list_file, body)?;
    Ok(())
}

/// Join `clips` into `output` without re-encoding.
///
/// The list file is left in place for the janitor.
pub async fn concat_clips(
    tools: &ToolRegistry,
    clips: &[PathBuf],
    list_file: &Path,
    output: &Path,
) -> dr_core::Result<PathBuf> {
    write_concat_list(list_file, clips)?;
    tracing::info!("concat {} clip(s) -> {}", clips.len(), output.display());

    let inv = ConcatList {
        list_file: list_file.to_path_buf(),
        output: output.to_path_buf(),
    };
    run_to_file(tools, &inv, output).await?;
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, b"mp4").unwrap();
        p
    }

    #[test]
    fn list_preserves_order() {
        let tmp = tempfile::tempdir().unwrap();
        let clips = vec![
            touch(tmp.path(), "c.mp4"),
            touch(tmp.path(), "a.mp4"),
            touch(tmp.path(), "b.mp4"),
        ];
        let list = tmp.path().join("temp").join("list.txt");

        write_concat_list(&list, &clips).unwrap();

        let body = std::fs::read_to_string(&list).unwrap();
        let names: Vec<&str> = body
            .lines()
            .map(|l| {
                let inner = l.strip_prefix("file '").unwrap().strip_suffix('\'').unwrap();
                inner.rsplit('/').next().unwrap()
            })
            .collect();
        assert_eq!(names, ["c.mp4", "a.mp4", "b.mp4"]);
    }

    #[test]
    fn rejects_single_quotes() {
        let tmp = tempfile::tempdir().unwrap();
        let clips = vec![touch(tmp.path(), "it's.mp4")];
        let err = write_concat_list(&tmp.path().join("list.txt"), &clips).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!tmp.path().join("list.txt").exists());
    }

    #[test]
    fn rejects_empty_clip_list() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(write_concat_list(&tmp.path().join("list.txt"), &[]).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn concat_produces_output() {
        use crate::actions::testutil;

        let tmp = tempfile::tempdir().unwrap();
        let tools = testutil::registry(testutil::working_ffmpeg(tmp.path()));
        let clips = vec![touch(tmp.path(), "1.mp4"), touch(tmp.path(), "2.mp4")];
        let out = tmp.path().join("joined.mp4");

        let joined = concat_clips(&tools, &clips, &tmp.path().join("list.txt"), &out)
            .await
            .unwrap();

        assert_eq!(joined, out);
        assert!(out.is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn concat_failure_surfaces_tool_exit() {
        use crate::actions::testutil;

        let tmp = tempfile::tempdir().unwrap();
        let tools = testutil::registry(testutil::failing_ffmpeg(tmp.path()));
        let clips = vec![touch(tmp.path(), "1.mp4")];
        let out = tmp.path().join("joined.mp4");

        let err = concat_clips(&tools, &clips, &tmp.path().join("list.txt"), &out)
            .await
            .unwrap_err();

        match err {
            Error::ToolExit { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("Conversion failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!out.exists());
    }
}
