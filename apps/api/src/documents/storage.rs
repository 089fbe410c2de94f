//! Local-disk storage for uploaded files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

/// Ensures the upload directory exists. Called once at startup, before the
/// first multipart request can land.
pub fn ensure_upload_dir(dir: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create upload directory '{dir}'"))
}

/// Writes an uploaded file under a timestamped name and returns its path.
/// The original filename is kept after the prefix so operators can
/// recognize files on disk.
pub fn store_upload(dir: &str, original_filename: &str, contents: &[u8]) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let safe_name = sanitize_filename(original_filename);
    let path = Path::new(dir).join(format!("{timestamp}_{safe_name}"));
    fs::write(&path, contents)
        .with_context(|| format!("failed to save upload {}", path.display()))?;
    Ok(path)
}

/// Strips path separators so a crafted filename cannot escape the upload
/// directory.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_upload_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_upload(dir.path().to_str().unwrap(), "terms.txt", b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_terms.txt"));
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a\\b.txt"), "a_b.txt");
        assert_eq!(sanitize_filename("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn test_stored_file_stays_inside_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_upload(dir.path().to_str().unwrap(), "../escape.txt", b"x").unwrap();
        assert!(path.starts_with(dir.path()));
    }
}
