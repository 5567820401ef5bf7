//! Output file handling.
//!
//! The renderer encodes into a sibling partial file and only moves it over
//! the configured output once FFmpeg succeeds. The move falls back to
//! copy-and-delete when the work directory and output live on different
//! filesystems.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Sibling path FFmpeg writes to before the output is complete:
/// `recap.mp4` becomes `recap.partial.mp4`.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "recap".to_string());

    let name = match output.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };

    output.with_file_name(name)
}

/// Create the parent directory of `path` if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Delete a partial output left by a failed encode. Missing files are fine.
pub async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

/// Move `src` to `dst`, replacing `dst` if it exists.
///
/// Tries a rename first and falls back to copy-and-delete on EXDEV.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent_dir(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Rename crosses filesystems, copying instead"
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV (18 on Linux and macOS).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

/// Copy next to `dst`, rename into place, then drop the source.
async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let staged = dst.with_extension("tmp");

    if let Err(e) = fs::copy(src, &staged).await {
        remove_partial(&staged).await;
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::rename(&staged, dst).await {
        remove_partial(&staged).await;
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::remove_file(src).await {
        warn!(path = %src.display(), error = %e, "Failed to remove source after copy");
    }

    Ok(())
}
