//! Media actions: clip encoding, concatenation, tone synthesis, audio
//! overlay and compression.

mod compress;
mod concat;
mod encode;
mod overlay;
mod tone;

pub use compress::{compress_video, DEFAULT_PRESET};
pub use concat::{concat_clips, write_concat_list};
pub use encode::{encode_clip, Clip, RetryPolicy};
pub use overlay::{overlay_audio, DEFAULT_AUDIO_BITRATE};
pub use tone::{listing_has_filter, supports_sine, synthesize_tone, DEFAULT_TONE_HZ};

use std::path::Path;

use crate::invocation::Invocation;
use crate::tools::ToolRegistry;

/// Run `inv`, then make sure `output` was actually produced.
///
/// On failure any partial output is removed so a later stage never picks
/// up a truncated file.
async fn run_to_file(
    tools: &ToolRegistry,
    inv: &dyn Invocation,
    output: &Path,
) -> dr_core::Result<()> {
    let cmd = inv.command(tools)?;
    let result = match cmd.execute().await {
        Ok(_) if output.is_file() => Ok(()),
        Ok(_) => Err(dr_core::Error::tool(
            cmd.program_name(),
            format!("{} produced no output at {}", inv.label(), output.display()),
        )),
        Err(e) => Err(e),
    };
    if result.is_err() && output.exists() {
        let _ = std::fs::remove_file(output);
    }
    result
}

#[cfg(all(test, unix))]
pub(crate) mod testutil {
    //! Shell-script stand-ins for ffmpeg.

    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use crate::tools::{ToolRegistry, ToolsConfig};

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Touches its last argument; prints a filter listing containing `sine`
    /// when asked for `-filters`.
    pub fn working_ffmpeg(dir: &Path) -> PathBuf {
        write_script(
            dir,
            "ffmpeg",
            r#"for last; do :; done
case "$*" in
  *-filters*)
    echo "Filters:"
    echo " ... sine              |->A       Generate sine wave audio signal."
    exit 0 ;;
esac
: > "$last"
"#,
        )
    }

    /// A build without `sine`; otherwise like [`working_ffmpeg`].
    pub fn ffmpeg_without_sine(dir: &Path) -> PathBuf {
        write_script(
            dir,
            "ffmpeg",
            r#"for last; do :; done
case "$*" in
  *-filters*)
    echo "Filters:"
    echo " ... anull             A->A       Pass the source unchanged to the output."
    exit 0 ;;
esac
: > "$last"
"#,
        )
    }

    /// Writes a partial output, complains on stderr, exits 1.
    pub fn failing_ffmpeg(dir: &Path) -> PathBuf {
        write_script(
            dir,
            "ffmpeg",
            r#"for last; do :; done
echo "partial" > "$last"
echo "Conversion failed!" >&2
exit 1
"#,
        )
    }

    /// Fails until it has been called `succeed_on` times.
    pub fn flaky_ffmpeg(dir: &Path, succeed_on: u32) -> PathBuf {
        let counter = dir.join("calls");
        write_script(
            dir,
            "ffmpeg",
            &format!(
                r#"for last; do :; done
n=$(cat "{counter}" 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > "{counter}"
if [ "$n" -lt {succeed_on} ]; then
  echo "transient failure $n" >&2
  exit 1
fi
: > "$last"
"#,
                counter = counter.display()
            ),
        )
    }

    pub fn calls(dir: &Path) -> u32 {
        std::fs::read_to_string(dir.join("calls"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn registry(ffmpeg: PathBuf) -> ToolRegistry {
        ToolRegistry::empty(&ToolsConfig::default()).with_tool("ffmpeg", ffmpeg)
    }
}
