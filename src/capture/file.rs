//! Temporary files used by the pipeline, and output naming for offline inversion.

use super::types::CaptureError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the inverted image offered as a file reference.
pub const STAGED_FILENAME: &str = "blackshot_inverted.png";

/// Fixed locations of the pipeline's temporary files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Where the screenshot tool writes the raw capture.
    pub capture: PathBuf,
    /// Where the inverted image is staged for file-reference pastes.
    pub staged: PathBuf,
}

impl ArtifactPaths {
    /// Paths inside `directory` using the given capture file name.
    pub fn in_dir(directory: &Path, capture_filename: &str) -> Self {
        Self {
            capture: directory.join(capture_filename),
            staged: directory.join(STAGED_FILENAME),
        }
    }

    /// Paths inside the system temporary directory.
    pub fn in_temp_dir(capture_filename: &str) -> Self {
        Self::in_dir(&std::env::temp_dir(), capture_filename)
    }
}

/// A capture is usable only if the file exists and is non-empty.
pub fn capture_is_usable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Remove a leftover capture so a cancelled run cannot pick up stale data.
pub fn clear_stale(path: &Path) -> Result<(), CaptureError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale capture file: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CaptureError::SaveError(e)),
    }
}

/// Write the inverted image to `path` with user-only permissions.
pub fn stage_file(image_data: &[u8], path: &Path) -> Result<PathBuf, CaptureError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    log::debug!(
        "Staging inverted image at {} ({} bytes)",
        path.display(),
        image_data.len()
    );
    fs::write(path, image_data)?;

    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, Permissions::from_mode(0o600))?;
    }

    Ok(path.to_path_buf())
}

/// Delete each path, ignoring files that are already gone.
pub fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => log::debug!("Removed temporary file: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temporary file {}: {}", path.display(), e),
        }
    }
}

/// Generate a filename based on the template and current time.
///
/// # Arguments
/// * `template` - Template string with chrono format specifiers
/// * `format` - File extension (e.g., "png")
pub fn generate_filename(template: &str, format: &str) -> String {
    let now = Local::now();
    let filename = now.format(template).to_string();
    format!("{}.{}", filename, format)
}

/// Default output path for `--invert`: a timestamped file next to the input.
pub fn default_inverted_output(input: &Path) -> PathBuf {
    let filename = generate_filename("inverted_%Y-%m-%d_%H%M%S", "png");
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(filename),
        _ => PathBuf::from(filename),
    }
}

/// Expand tilde (~) in path strings.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_filename() {
        let filename = generate_filename("test_%Y%m%d", "png");
        assert!(filename.starts_with("test_"));
        assert!(filename.ends_with(".png"));
        assert!(filename.contains("20"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/Pictures");
        assert!(!expanded.to_string_lossy().starts_with("~"));

        let no_tilde = expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn artifact_paths_share_directory() {
        let paths = ArtifactPaths::in_dir(Path::new("/tmp/x"), "cap.png");
        assert_eq!(paths.capture, PathBuf::from("/tmp/x/cap.png"));
        assert_eq!(paths.staged, PathBuf::from("/tmp/x").join(STAGED_FILENAME));
    }

    #[test]
    fn empty_and_missing_captures_are_not_usable() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.png");
        assert!(!capture_is_usable(&missing));

        let empty = temp.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        assert!(!capture_is_usable(&empty));

        let full = temp.path().join("full.png");
        fs::write(&full, b"data").unwrap();
        assert!(capture_is_usable(&full));

        assert!(!capture_is_usable(temp.path()));
    }

    #[test]
    fn clear_stale_tolerates_missing_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("old.png");
        clear_stale(&path).unwrap();
        fs::write(&path, b"old").unwrap();
        clear_stale(&path).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn staged_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = stage_file(b"png", &temp.path().join("staged.png")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn remove_artifacts_skips_missing() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("a.png");
        fs::write(&present, b"a").unwrap();
        remove_artifacts(&[present.clone(), temp.path().join("b.png")]);
        assert!(!present.exists());
    }

    #[test]
    fn default_output_sits_next_to_input() {
        let output = default_inverted_output(Path::new("/some/dir/shot.png"));
        assert_eq!(output.parent(), Some(Path::new("/some/dir")));
        assert!(output.to_string_lossy().ends_with(".png"));
    }
}
