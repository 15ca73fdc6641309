use crate::types::{EdgeKind, FileEdge, FileGraph, FileNode};
use manole_vector_store::{Passage, VectorIndex};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;
use std::path::Path;

const SAMPLE_PASSAGES_PER_FILE: usize = 5;
const SAMPLE_MAX_CHARS: usize = 2_000;
const SIMILARITY_TOP_K: usize = 5;
const SIMILARITY_FLOOR: f32 = 0.6;
const MIN_REFERENCE_NAME_LEN: usize = 4;

struct FileGroup {
    relpath: String,
    passages: Vec<Passage>,
}

/// `FileGraph` computation (spec.md §4.14): pure, over an existing
/// index's passages and its query-embedding function. Internally built
/// as a real `petgraph` digraph (mirroring the teacher's two-phase
/// nodes-then-edges graph construction) and flattened to
/// `{nodes, edges}` for the wire.
pub fn compute(data_dir: &Path, index: &dyn VectorIndex) -> FileGraph {
    let groups = group_by_file(index.passages());

    let mut graph: DiGraph<String, FileEdge> = DiGraph::new();
    let mut node_index: HashMap<String, NodeIndex> = HashMap::new();
    let mut nodes = Vec::with_capacity(groups.len());

    for group in &groups {
        let idx = graph.add_node(group.relpath.clone());
        node_index.insert(group.relpath.clone(), idx);
        nodes.push(FileNode {
            id: group.relpath.clone(),
            path: group.relpath.clone(),
            size: file_size(data_dir, &group.relpath),
        });
    }

    add_similarity_edges(&groups, index, &mut graph, &node_index);
    add_reference_edges(&groups, &mut graph, &node_index);
    add_structure_edges(&groups, &mut graph, &mut node_index);

    let edges = graph
        .edge_references()
        .map(|e| e.weight().clone())
        .collect();

    FileGraph { nodes, edges }
}

fn group_by_file(passages: Vec<Passage>) -> Vec<FileGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut by_path: HashMap<String, Vec<Passage>> = HashMap::new();

    for passage in passages {
        let path = passage.metadata.file_path.clone();
        if path.is_empty() {
            continue;
        }
        by_path.entry(path.clone()).or_insert_with(|| {
            order.push(path.clone());
            Vec::new()
        });
        by_path.get_mut(&path).unwrap().push(passage);
    }

    order
        .into_iter()
        .map(|relpath| {
            let passages = by_path.remove(&relpath).unwrap_or_default();
            FileGroup { relpath, passages }
        })
        .collect()
}

fn file_size(data_dir: &Path, relpath: &str) -> Option<u64> {
    std::fs::metadata(data_dir.join(relpath)).ok().map(|m| m.len())
}

fn sample_text(group: &FileGroup) -> String {
    let mut out = String::new();
    for passage in group.passages.iter().take(SAMPLE_PASSAGES_PER_FILE) {
        if out.len() >= SAMPLE_MAX_CHARS {
            break;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&passage.text);
    }
    out.chars().take(SAMPLE_MAX_CHARS).collect()
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Embedding failures degrade gracefully to no similarity edges at all
/// (spec.md §4.14): "best-effort... embedding failures degrade
/// gracefully to an empty similarity edge set".
fn add_similarity_edges(
    groups: &[FileGroup],
    index: &dyn VectorIndex,
    graph: &mut DiGraph<String, FileEdge>,
    node_index: &HashMap<String, NodeIndex>,
) {
    if groups.len() < 2 {
        return;
    }

    let vectors: Vec<Vec<f32>> = groups
        .iter()
        .map(|g| {
            let mut v = index.embed(&sample_text(g));
            normalize(&mut v);
            v
        })
        .collect();

    if vectors.iter().any(|v| v.is_empty()) {
        log::warn!("file graph: embedding returned an empty vector, skipping similarity edges");
        return;
    }

    let mut emitted: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();

    for (i, group) in groups.iter().enumerate() {
        let mut scored: Vec<(usize, f32)> = (0..groups.len())
            .filter(|&j| j != i)
            .map(|j| (j, cosine(&vectors[i], &vectors[j])))
            .filter(|(_, score)| *score >= SIMILARITY_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(SIMILARITY_TOP_K);

        for (j, score) in scored {
            let other = &groups[j];
            let pair = if group.relpath <= other.relpath {
                (group.relpath.clone(), other.relpath.clone())
            } else {
                (other.relpath.clone(), group.relpath.clone())
            };
            if !emitted.insert(pair.clone()) {
                continue;
            }
            let weight = (score as f64 * 1000.0).round() / 1000.0;
            let (Some(&from), Some(&to)) = (node_index.get(&pair.0), node_index.get(&pair.1)) else {
                continue;
            };
            graph.add_edge(
                from,
                to,
                FileEdge {
                    source: pair.0,
                    target: pair.1,
                    kind: EdgeKind::Similarity,
                    label: "similar".to_string(),
                    weight: Some(weight),
                },
            );
        }
    }
}

fn add_reference_edges(
    groups: &[FileGroup],
    graph: &mut DiGraph<String, FileEdge>,
    node_index: &HashMap<String, NodeIndex>,
) {
    let names: Vec<(String, String)> = groups
        .iter()
        .map(|g| {
            let name = Path::new(&g.relpath)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| g.relpath.clone());
            (g.relpath.clone(), name)
        })
        .collect();

    for source in groups {
        let haystack: String = source
            .passages
            .iter()
            .map(|p| p.text.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        for (target_path, target_name) in &names {
            if *target_path == source.relpath || target_name.len() < MIN_REFERENCE_NAME_LEN {
                continue;
            }
            if haystack.contains(&target_name.to_lowercase()) {
                let (Some(&from), Some(&to)) =
                    (node_index.get(&source.relpath), node_index.get(target_path))
                else {
                    continue;
                };
                graph.add_edge(
                    from,
                    to,
                    FileEdge {
                        source: source.relpath.clone(),
                        target: target_path.clone(),
                        kind: EdgeKind::Reference,
                        label: format!("mentions {target_name}"),
                        weight: None,
                    },
                );
            }
        }
    }
}

fn add_structure_edges(
    groups: &[FileGroup],
    graph: &mut DiGraph<String, FileEdge>,
    node_index: &mut HashMap<String, NodeIndex>,
) {
    let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();

    for group in groups {
        let parts: Vec<&str> = group.relpath.split('/').collect();
        let mut ancestor = String::new();
        for (i, part) in parts.iter().enumerate() {
            let child = if ancestor.is_empty() {
                part.to_string()
            } else {
                format!("{ancestor}/{part}")
            };
            if i > 0 && !ancestor.is_empty() && seen.insert((ancestor.clone(), child.clone())) {
                let from = *node_index
                    .entry(ancestor.clone())
                    .or_insert_with(|| graph.add_node(ancestor.clone()));
                let to = *node_index
                    .entry(child.clone())
                    .or_insert_with(|| graph.add_node(child.clone()));
                graph.add_edge(
                    from,
                    to,
                    FileEdge {
                        source: ancestor.clone(),
                        target: child.clone(),
                        kind: EdgeKind::Structure,
                        label: "contains".to_string(),
                        weight: None,
                    },
                );
            }
            ancestor = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manole_vector_store::{InMemoryVectorIndex, Metadata};

    fn meta(path: &str) -> Metadata {
        Metadata::new(path)
    }

    #[tokio::test]
    async fn groups_nodes_by_relative_file_path() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index.add("budget report".to_string(), meta("docs/a.pdf")).await.unwrap();
        index.add("budget appendix".to_string(), meta("docs/a.pdf")).await.unwrap();
        index.add("unrelated".to_string(), meta("src/c.py")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let graph = compute(dir.path(), &index);

        let ids: std::collections::HashSet<_> = graph.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("docs/a.pdf"));
        assert!(ids.contains("src/c.py"));
    }

    #[tokio::test]
    async fn structure_edges_connect_directories_to_files() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index.add("a".to_string(), meta("docs/a.pdf")).await.unwrap();
        index.add("b".to_string(), meta("docs/b.pdf")).await.unwrap();
        index.add("c".to_string(), meta("src/c.py")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let graph = compute(dir.path(), &index);

        let structure: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Structure)
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();
        assert!(structure.contains(&("docs".to_string(), "docs/a.pdf".to_string())));
        assert!(structure.contains(&("docs".to_string(), "docs/b.pdf".to_string())));
        assert!(structure.contains(&("src".to_string(), "src/c.py".to_string())));
    }

    #[tokio::test]
    async fn reference_edges_detect_whole_filename_mentions() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index
            .add("see report.pdf for details".to_string(), meta("notes.txt"))
            .await
            .unwrap();
        index.add("quarterly numbers".to_string(), meta("report.pdf")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let graph = compute(dir.path(), &index);

        assert!(graph.edges.iter().any(|e| e.kind == EdgeKind::Reference
            && e.source == "notes.txt"
            && e.target == "report.pdf"));
    }

    #[tokio::test]
    async fn similarity_edges_never_go_below_the_floor() {
        let index = InMemoryVectorIndex::with_hash_embedder();
        index
            .add("budget numbers for project alpha".to_string(), meta("a.txt"))
            .await
            .unwrap();
        index
            .add("budget numbers for project alpha, continued".to_string(), meta("b.txt"))
            .await
            .unwrap();
        index.add("a photo of a cat".to_string(), meta("c.txt")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let graph = compute(dir.path(), &index);

        assert!(graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Similarity)
            .all(|e| e.weight.unwrap_or(0.0) >= SIMILARITY_FLOOR as f64));
    }
}
