use std::path::Path;

/// Derive a stable `dir_id` from an absolute data-directory path
/// (spec.md §4.15: "derived from the absolute path, name with unsafe
/// characters normalized"). Every path separator and any character
/// outside `[A-Za-z0-9_-]` becomes `_`; the full path (not just the
/// basename) is normalized so two different directories never collide
/// on the same leaf name.
pub fn derive(data_dir: &Path) -> String {
    let absolute = data_dir
        .canonicalize()
        .unwrap_or_else(|_| data_dir.to_path_buf());
    let raw = absolute.to_string_lossy();

    let mut id = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            id.push(ch);
        } else {
            id.push('_');
        }
    }
    id.trim_matches('_').to_string()
}
