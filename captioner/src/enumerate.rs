use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Image extensions the captioner scans for (spec.md §4.12 step 1).
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "heic", "heif",
];

/// Recursively enumerate image files under `root`, skipping hidden
/// entries the same way `ToolBox`'s walk does.
pub fn image_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for result in WalkBuilder::new(root.as_ref()).hidden(true).build() {
        let Ok(entry) = result else { continue };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_image {
            out.push(path.to_path_buf());
        }
    }
    out.sort();
    out
}
