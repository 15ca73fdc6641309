use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions the text-extraction pipeline never handles (spec.md
/// §4.13 step 2: "skipping those whose detected MIME is in a configured
/// skip set, e.g. images in the text pipeline"). Images are indexed
/// separately by the captioner, so they're skipped here by extension
/// rather than a real MIME sniff — good enough for a personal-file
/// corpus and avoids a dependency edge onto the captioner crate.
const SKIP_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "heic", "heif",
];

pub fn is_skipped(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SKIP_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Recursively list regular, non-hidden, non-skipped files under `root`.
pub fn scan_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for result in WalkBuilder::new(root).hidden(true).build() {
        let Ok(entry) = result else { continue };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        if !is_skipped(path) {
            files.push(path.to_path_buf());
        }
    }
    files
}

pub async fn mtime_string(path: &Path) -> std::io::Result<String> {
    let meta = tokio::fs::metadata(path).await?;
    let modified = meta.modified()?;
    let since_epoch = modified.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    Ok(since_epoch.as_secs().to_string())
}

pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn skips_images_and_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        fs::write(dir.path().join("photo.jpg"), b"hi").unwrap();
        fs::create_dir(dir.path().join(".neurofind")).unwrap();
        fs::write(dir.path().join(".neurofind").join("manifest.json"), b"{}").unwrap();

        let files = scan_files(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "notes.txt");
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/data");
        let rel = relative_path(root, Path::new("/data/sub/file.txt"));
        assert_eq!(rel, "sub/file.txt");
    }
}
