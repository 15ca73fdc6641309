use manole_extractor::FileReader;
use manole_toolbox::ToolBox;
use std::collections::HashSet;
use std::path::PathBuf;

/// Max files read through the filename fallback (spec.md §4.8 step 5).
const MAX_FALLBACK_FILES: usize = 3;

/// Grep the data directory's filenames for each query keyword and read
/// the first few hits in full. Returns `(display name, full text)`
/// pairs ready for the same per-chunk extraction the vector-search path
/// uses.
pub async fn candidate_files(
    query: &str,
    toolbox: &ToolBox,
    file_reader: &FileReader,
) -> Vec<(String, String)> {
    let keywords = manole_nlp::extract_keywords(query);
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut paths: Vec<PathBuf> = Vec::new();
    for keyword in &keywords {
        for path in toolbox.grep_paths(keyword) {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
            if paths.len() >= MAX_FALLBACK_FILES {
                break;
            }
        }
        if paths.len() >= MAX_FALLBACK_FILES {
            break;
        }
    }

    let mut files = Vec::new();
    for path in paths {
        let Ok(text) = file_reader.read(&path).await else {
            continue;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        files.push((name, text));
    }
    files
}
