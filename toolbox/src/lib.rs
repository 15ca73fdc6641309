//! # Manole ToolBox
//!
//! Pure-filesystem queries against one indexed data directory: counts,
//! listings, metadata, a directory tree, filename grep, and aggregate
//! stats. Every op skips hidden files and dotfiles (spec.md §4.5) and
//! bounds its own output so it fits comfortably inside agent context.

mod error;
mod time_filter;

pub use error::ToolBoxError;
pub use time_filter::TimeFilter;

use ignore::WalkBuilder;
use regex::RegexBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub type Result<T> = std::result::Result<T, ToolBoxError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Date,
    Size,
    Name,
    Count,
}

impl SortBy {
    pub fn parse(s: &str) -> Self {
        match s {
            "size" => SortBy::Size,
            "name" => SortBy::Name,
            "count" => SortBy::Count,
            _ => SortBy::Date,
        }
    }
}

struct Entry {
    path: PathBuf,
    relpath: String,
    size: u64,
    modified: SystemTime,
}

pub struct ToolBox {
    root: PathBuf,
}

impl ToolBox {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn walk(&self) -> Vec<Entry> {
        let mut entries = Vec::new();
        for result in WalkBuilder::new(&self.root).hidden(true).build() {
            let Ok(dir_entry) = result else { continue };
            if !dir_entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }
            let Ok(metadata) = dir_entry.metadata() else { continue };
            let path = dir_entry.path().to_path_buf();
            let relpath = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            entries.push(Entry {
                path,
                relpath,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        entries
    }

    fn matches_ext(path: &Path, ext: Option<&str>) -> bool {
        match ext {
            None => true,
            Some(ext) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(ext))
                .unwrap_or(false),
        }
    }

    fn matches_time(modified: SystemTime, time_filter: Option<TimeFilter>) -> bool {
        match time_filter {
            None => true,
            Some(filter) => filter.matches(modified, SystemTime::now()),
        }
    }

    /// `"Found N .ext files."`
    pub fn count_files(&self, ext: Option<&str>, time: Option<TimeFilter>) -> String {
        let count = self
            .walk()
            .into_iter()
            .filter(|e| Self::matches_ext(&e.path, ext) && Self::matches_time(e.modified, time))
            .count();
        match ext {
            Some(ext) => format!("Found {count} .{ext} files."),
            None => format!("Found {count} files."),
        }
    }

    /// Header line + up to `limit` entries, each `"  - relpath (annotation)"`.
    pub fn list_recent_files(
        &self,
        ext: Option<&str>,
        time: Option<TimeFilter>,
        limit: usize,
        sort_by: SortBy,
    ) -> String {
        let mut entries: Vec<Entry> = self
            .walk()
            .into_iter()
            .filter(|e| Self::matches_ext(&e.path, ext) && Self::matches_time(e.modified, time))
            .collect();

        match sort_by {
            SortBy::Date | SortBy::Count => entries.sort_by(|a, b| b.modified.cmp(&a.modified)),
            SortBy::Size => entries.sort_by(|a, b| b.size.cmp(&a.size)),
            SortBy::Name => entries.sort_by(|a, b| a.relpath.cmp(&b.relpath)),
        }
        entries.truncate(limit);

        let mut out = format!("{} file(s):\n", entries.len());
        for entry in &entries {
            let annotation = match sort_by {
                SortBy::Size => format_size(entry.size),
                _ => format_modified(entry.modified),
            };
            out.push_str(&format!("  - {} ({annotation})\n", entry.relpath));
        }
        out.trim_end().to_string()
    }

    /// Size (KB/MB) + modified time for up to 10 substring matches.
    pub fn get_file_metadata(&self, name_hint: Option<&str>) -> String {
        let mut entries: Vec<Entry> = self
            .walk()
            .into_iter()
            .filter(|e| match name_hint {
                Some(hint) => entry_name(e).to_lowercase().contains(&hint.to_lowercase()),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| a.relpath.cmp(&b.relpath));
        entries.truncate(10);

        if entries.is_empty() {
            return "No matching files found.".to_string();
        }

        let mut out = String::new();
        for entry in &entries {
            out.push_str(&format!(
                "{}: {}, modified {}\n",
                entry.relpath,
                format_size(entry.size),
                format_modified(entry.modified)
            ));
        }
        out.trim_end().to_string()
    }

    /// ASCII directory tree rooted at the data dir.
    pub fn tree(&self, max_depth: Option<usize>) -> String {
        let mut out = String::from(".\n");
        self.tree_recurse(&self.root, 0, max_depth, &mut out);
        out.trim_end().to_string()
    }

    fn tree_recurse(&self, dir: &Path, depth: usize, max_depth: Option<usize>, out: &mut String) {
        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        let Ok(mut read_dir) = std::fs::read_dir(dir) else { return };
        let mut children: Vec<PathBuf> = Vec::new();
        while let Some(Ok(child)) = read_dir.next() {
            let path = child.path();
            let is_hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false);
            if !is_hidden {
                children.push(path);
            }
        }
        children.sort();

        for child in children {
            let indent = "  ".repeat(depth + 1);
            let name = child.file_name().unwrap_or_default().to_string_lossy();
            if child.is_dir() {
                out.push_str(&format!("{indent}{name}/\n"));
                self.tree_recurse(&child, depth + 1, max_depth, out);
            } else {
                out.push_str(&format!("{indent}{name}\n"));
            }
        }
    }

    /// Up to 20 matching file paths (filenames matched against
    /// `pattern`, case-insensitive), relative to the data directory.
    pub fn grep(&self, pattern: &str) -> Vec<String> {
        self.matching_relpaths(pattern).into_iter().take(20).collect()
    }

    /// Same match set as `grep`, as absolute paths.
    pub fn grep_paths(&self, pattern: &str) -> Vec<PathBuf> {
        let matches: std::collections::HashSet<String> =
            self.matching_relpaths(pattern).into_iter().take(20).collect();
        self.walk()
            .into_iter()
            .filter(|e| matches.contains(&e.relpath))
            .map(|e| e.path)
            .collect()
    }

    fn matching_relpaths(&self, pattern: &str) -> Vec<String> {
        let regex = RegexBuilder::new(&regex::escape(pattern))
            .case_insensitive(true)
            .build();
        let mut matches: Vec<String> = self
            .walk()
            .into_iter()
            .filter(|e| match &regex {
                Ok(re) => re.is_match(&entry_name(e)),
                Err(_) => entry_name(e).to_lowercase().contains(&pattern.to_lowercase()),
            })
            .map(|e| e.relpath)
            .collect();
        matches.sort();
        matches
    }

    /// Per-folder aggregate + total, sorted by `sort_by`.
    pub fn folder_stats(&self, sort_by: SortBy, limit: usize) -> String {
        let mut per_folder: std::collections::HashMap<String, (u64, u64)> =
            std::collections::HashMap::new();
        for entry in self.walk() {
            let folder = Path::new(&entry.relpath)
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string());
            let agg = per_folder.entry(folder).or_insert((0, 0));
            agg.0 += 1;
            agg.1 += entry.size;
        }

        let mut rows: Vec<(String, u64, u64)> =
            per_folder.into_iter().map(|(f, (c, s))| (f, c, s)).collect();
        match sort_by {
            SortBy::Size => rows.sort_by(|a, b| b.2.cmp(&a.2)),
            SortBy::Count | SortBy::Date | SortBy::Name => rows.sort_by(|a, b| b.1.cmp(&a.1)),
        }
        rows.truncate(limit);

        let total_files: u64 = rows.iter().map(|r| r.1).sum();
        let total_size: u64 = rows.iter().map(|r| r.2).sum();

        let mut out = String::new();
        for (folder, count, size) in &rows {
            out.push_str(&format!("{folder}: {count} files, {}\n", format_size(*size)));
        }
        out.push_str(&format!("Total: {total_files} files, {}", format_size(total_size)));
        out
    }

    /// Total, average, top-10 by extension.
    pub fn disk_usage(&self) -> String {
        let entries = self.walk();
        let total_size: u64 = entries.iter().map(|e| e.size).sum();
        let total_files = entries.len() as u64;
        let avg = if total_files > 0 { total_size / total_files } else { 0 };

        let mut by_ext: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
        for entry in &entries {
            let ext = entry
                .path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_lowercase();
            *by_ext.entry(ext).or_insert(0) += entry.size;
        }
        let mut by_ext: Vec<(String, u64)> = by_ext.into_iter().collect();
        by_ext.sort_by(|a, b| b.1.cmp(&a.1));
        by_ext.truncate(10);

        let mut out = format!(
            "Total: {} across {total_files} files. Average file size: {}.\n",
            format_size(total_size),
            format_size(avg)
        );
        out.push_str("Top extensions by size:\n");
        for (ext, size) in &by_ext {
            out.push_str(&format!("  - .{ext}: {}\n", format_size(*size)));
        }
        out.trim_end().to_string()
    }
}

fn entry_name(entry: &Entry) -> String {
    entry
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn format_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

fn format_modified(modified: SystemTime) -> String {
    match modified.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => format!("{}s", d.as_secs()),
        Err(_) => "unknown".to_string(),
    }
}
