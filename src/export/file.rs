//! File naming and atomic writes for exported documents.

use super::types::ExportError;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a filename based on the template and current time.
///
/// # Arguments
/// * `template` - Template string with chrono format specifiers
/// * `extension` - File extension (e.g., "pdf")
pub fn generate_filename(template: &str, extension: &str) -> String {
    let now = Local::now();
    let filename = now.format(template).to_string();
    format!("{}.{}", filename, extension)
}

/// Ensure the directory exists, creating it if necessary.
///
/// Returns the canonicalized path to the directory.
pub fn ensure_directory_exists(directory: &Path) -> Result<PathBuf, ExportError> {
    if !directory.exists() {
        log::info!("Creating export directory: {}", directory.display());
        fs::create_dir_all(directory)?;
    }

    let canonical = directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf());

    Ok(canonical)
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

/// A sibling of `target` ending in `suffix` that does not exist yet.
pub fn temp_path(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let mut candidate = target.with_file_name(format!(".{}.{}", name, suffix));
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = target.with_file_name(format!(".{}.{}{}", name, suffix, counter));
    }
    candidate
}

/// Writes `bytes` to a temporary file next to `path`, then renames it into
/// place. A failed write never leaves a partial file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory_exists(parent)?;
    }

    let tmp_path = temp_path(path, "tmp");
    let result = (|| -> Result<(), ExportError> {
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        fs::remove_file(&tmp_path).ok();
    }
    result?;

    log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_filename() {
        let filename = generate_filename("alchemy-%Y-%m-%d", "pdf");
        assert!(filename.starts_with("alchemy-"));
        assert!(filename.ends_with(".pdf"));
        assert!(filename.contains("20"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/Alchemy");
        assert!(!expanded.to_string_lossy().starts_with("~"));

        let no_tilde = expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn temp_path_stays_beside_target() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("out.pdf");
        let first = temp_path(&target, "tmp");
        assert_eq!(first.parent(), target.parent());
        fs::write(&first, b"busy").unwrap();
        let second = temp_path(&target, "tmp");
        assert_ne!(first, second);
    }

    #[test]
    fn write_atomic_creates_directories() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("nested").join("page.pdf");
        write_atomic(&target, b"%PDF").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"%PDF");
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }
}
