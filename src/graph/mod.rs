//! Relation subgraph → renderable node/edge graph.
//!
//! [`build_graph`] turns a [`Subgraph`] into [`GraphData`] for a
//! force-directed renderer. Entities have no ids on the wire, so node identity
//! comes from an [`EntityResolver`]; the default [`TextEntityResolver`] keys
//! entities by their trimmed text. Relations sharing a
//! `(from, to, relation_type)` triple collapse into one edge that remembers
//! how many relations it stands for and their mean confidence.
//!
//! Node and edge ids (`n1`, `e1`, ...) follow insertion order: relations first,
//! then standalone facts.

pub mod render;

use serde::Serialize;
use std::collections::HashMap;

use crate::api::types::Subgraph;

/// Relation type used when the backend sends a blank one.
pub const DEFAULT_RELATION_TYPE: &str = "related_to";

/// Character budget for node labels.
pub const NODE_LABEL_MAX: usize = 26;
/// Character budget for a plain edge label.
pub const EDGE_LABEL_MAX: usize = 22;
/// Character budget for the type part of an `"<type> xN"` edge label.
pub const EDGE_LABEL_MAX_COUNTED: usize = 18;

pub const NODE_BASE_SIZE: f64 = 12.0;
pub const NODE_SIZE_PER_DEGREE: f64 = 2.0;
pub const NODE_SIZE_CAP_DELTA: f64 = 16.0;
/// Largest size any node can reach.
pub const NODE_MAX_SIZE: f64 = NODE_BASE_SIZE + NODE_SIZE_CAP_DELTA;

pub const EDGE_BASE_WIDTH: f64 = 1.0;
pub const EDGE_WIDTH_CAP_DELTA: f64 = 2.0;
/// Widest any edge can be drawn.
pub const EDGE_MAX_WIDTH: f64 = EDGE_BASE_WIDTH + EDGE_WIDTH_CAP_DELTA;

/// Maps raw endpoint text to an entity key. `None` means "cannot be drawn".
///
/// Two endpoints with the same key become the same node.
pub trait EntityResolver {
    fn resolve(&self, raw: &str) -> Option<String>;
}

/// Identity by surface text: trim whitespace, skip empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEntityResolver;

impl EntityResolver for TextEntityResolver {
    fn resolve(&self, raw: &str) -> Option<String> {
        let text = raw.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    /// Display label, truncated to [`NODE_LABEL_MAX`] characters.
    pub label: String,
    /// Untruncated entity text for tooltips.
    #[serde(rename = "title")]
    pub full_text: String,
    /// Number of processed relations touching this node.
    pub degree: u32,
    /// `true` for relation endpoints, `false` for standalone facts.
    pub pinned: bool,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub label: String,
    /// Number of relations collapsed into this edge.
    pub occurrence_count: u32,
    pub avg_confidence: f64,
    pub width: f64,
    /// First non-empty `meta_type` among the collapsed relations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
    /// Tooltip, e.g. `"likes, count: 2, conf: 0.80"`.
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// `false` when the subgraph only produced isolated nodes.
    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look a node up by its untruncated text.
    pub fn node_by_text(&self, text: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.full_text == text)
    }
}

/// Edge accumulator keyed by `(from, to, relation_type)`.
struct EdgeAcc {
    from: usize,
    to: usize,
    relation_type: String,
    count: u32,
    conf_sum: f64,
    meta_type: Option<String>,
}

/// Build graph data with text-based entity identity.
pub fn build_graph(subgraph: &Subgraph) -> GraphData {
    build_graph_with(subgraph, &TextEntityResolver)
}

/// Build graph data using a custom entity resolver.
pub fn build_graph_with(subgraph: &Subgraph, resolver: &dyn EntityResolver) -> GraphData {
    let mut builder = NodeTable::default();
    let mut edge_index: HashMap<(usize, usize, String), usize> = HashMap::new();
    let mut edges: Vec<EdgeAcc> = Vec::new();

    for relation in &subgraph.relations {
        let (Some(source), Some(target)) = (
            resolver.resolve(&relation.source_content),
            resolver.resolve(&relation.target_content),
        ) else {
            continue;
        };

        let from = builder.intern(source, true);
        let to = builder.intern(target, true);
        // Per relation, not per collapsed edge. A self-loop counts twice.
        builder.degrees[from] += 1;
        builder.degrees[to] += 1;

        let relation_type = match relation.relation_type.trim() {
            "" => DEFAULT_RELATION_TYPE.to_string(),
            t => t.to_string(),
        };

        let slot = *edge_index
            .entry((from, to, relation_type.clone()))
            .or_insert_with(|| {
                edges.push(EdgeAcc {
                    from,
                    to,
                    relation_type,
                    count: 0,
                    conf_sum: 0.0,
                    meta_type: None,
                });
                edges.len() - 1
            });

        let acc = &mut edges[slot];
        acc.count += 1;
        acc.conf_sum += relation.confidence_or_zero();
        if acc.meta_type.is_none() {
            acc.meta_type = relation
                .meta_type
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
        }
    }

    for fact in &subgraph.facts {
        if let Some(text) = resolver.resolve(&fact.content) {
            builder.intern(text, false);
        }
    }

    let nodes = builder.finish();
    let edges = edges
        .into_iter()
        .enumerate()
        .map(|(i, acc)| finish_edge(i, acc, &nodes))
        .collect();

    GraphData { nodes, edges }
}

#[derive(Default)]
struct NodeTable {
    by_key: HashMap<String, usize>,
    keys: Vec<String>,
    pinned: Vec<bool>,
    degrees: Vec<u32>,
}

impl NodeTable {
    /// Return the slot for `key`, creating it on first sight.
    /// The first sighting decides `pinned`.
    fn intern(&mut self, key: String, pinned: bool) -> usize {
        if let Some(&idx) = self.by_key.get(&key) {
            return idx;
        }
        let idx = self.keys.len();
        self.by_key.insert(key.clone(), idx);
        self.keys.push(key);
        self.pinned.push(pinned);
        self.degrees.push(0);
        idx
    }

    fn finish(self) -> Vec<GraphNode> {
        self.keys
            .into_iter()
            .zip(self.pinned)
            .zip(self.degrees)
            .enumerate()
            .map(|(i, ((text, pinned), degree))| GraphNode {
                id: node_id(i),
                label: truncate(&text, NODE_LABEL_MAX),
                full_text: text,
                degree,
                pinned,
                size: node_size(degree),
            })
            .collect()
    }
}

fn finish_edge(i: usize, acc: EdgeAcc, nodes: &[GraphNode]) -> GraphEdge {
    let avg_confidence = if acc.count > 0 {
        acc.conf_sum / f64::from(acc.count)
    } else {
        0.0
    };
    let label = if acc.count > 1 {
        format!(
            "{} x{}",
            truncate(&acc.relation_type, EDGE_LABEL_MAX_COUNTED),
            acc.count
        )
    } else {
        truncate(&acc.relation_type, EDGE_LABEL_MAX)
    };
    let width = if acc.count > 0 {
        edge_width(avg_confidence)
    } else {
        EDGE_BASE_WIDTH
    };

    GraphEdge {
        id: format!("e{}", i + 1),
        from: nodes[acc.from].id.clone(),
        to: nodes[acc.to].id.clone(),
        title: format!(
            "{}, count: {}, conf: {:.2}",
            acc.relation_type, acc.count, avg_confidence
        ),
        relation_type: acc.relation_type,
        label,
        occurrence_count: acc.count,
        avg_confidence,
        width,
        meta_type: acc.meta_type,
    }
}

fn node_id(i: usize) -> String {
    format!("n{}", i + 1)
}

/// Visual size for a node: grows with degree, capped at [`NODE_MAX_SIZE`].
pub fn node_size(degree: u32) -> f64 {
    NODE_BASE_SIZE + (f64::from(degree) * NODE_SIZE_PER_DEGREE).min(NODE_SIZE_CAP_DELTA)
}

/// Visual weight for an edge: grows with mean confidence, capped at [`EDGE_MAX_WIDTH`].
pub fn edge_width(avg_confidence: f64) -> f64 {
    let conf = if avg_confidence.is_finite() {
        avg_confidence.max(0.0)
    } else {
        0.0
    };
    EDGE_BASE_WIDTH + (conf * 2.0).min(EDGE_WIDTH_CAP_DELTA)
}

/// Cut `s` to at most `max` characters, ending in `...` when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Fact, Relation};

    fn subgraph(relations: Vec<Relation>, facts: Vec<Fact>) -> Subgraph {
        Subgraph {
            facts_count: facts.len() as u64,
            relations_count: relations.len() as u64,
            facts,
            relations,
        }
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 26), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("abcdefgh", 8), "abcdefgh");
        // multi-byte text is cut on char boundaries
        assert_eq!(truncate("核心内容包括计划拆解", 6), "核心内...");
    }

    #[test]
    fn node_size_is_bounded() {
        assert_eq!(node_size(0), 12.0);
        assert_eq!(node_size(3), 18.0);
        assert_eq!(node_size(8), NODE_MAX_SIZE);
        assert_eq!(node_size(1000), NODE_MAX_SIZE);
        let mut last = 0.0;
        for d in 0..50 {
            assert!(node_size(d) >= last);
            last = node_size(d);
        }
    }

    #[test]
    fn edge_width_is_bounded() {
        assert_eq!(edge_width(0.0), 1.0);
        assert_eq!(edge_width(0.5), 2.0);
        assert_eq!(edge_width(1.0), EDGE_MAX_WIDTH);
        assert_eq!(edge_width(7.0), EDGE_MAX_WIDTH);
        assert_eq!(edge_width(-1.0), 1.0);
        assert_eq!(edge_width(f64::NAN), 1.0);
    }

    #[test]
    fn whitespace_variants_share_a_node() {
        let g = build_graph(&subgraph(
            vec![
                Relation::new("  Alice ", "knows", "Bob", 0.5),
                Relation::new("Carol", "knows", "Alice\n", 0.5),
            ],
            vec![],
        ));
        assert_eq!(g.nodes.len(), 3);
        let alice = g.node_by_text("Alice").unwrap();
        assert_eq!(alice.degree, 2);
        assert_eq!(g.edges[0].from, alice.id);
        assert_eq!(g.edges[1].to, alice.id);
    }

    #[test]
    fn blank_relation_type_defaults() {
        let g = build_graph(&subgraph(vec![Relation::new("A", "   ", "B", 0.3)], vec![]));
        assert_eq!(g.edges[0].relation_type, DEFAULT_RELATION_TYPE);
        assert_eq!(g.edges[0].label, DEFAULT_RELATION_TYPE);
    }

    #[test]
    fn edge_label_truncation() {
        let long_type = "is_a_very_long_relation_type_name";
        let g = build_graph(&subgraph(
            vec![
                Relation::new("A", long_type, "B", 0.3),
                Relation::new("A", long_type, "B", 0.3),
                Relation::new("B", long_type, "C", 0.3),
            ],
            vec![],
        ));
        assert_eq!(g.edges[0].label, "is_a_very_long_... x2");
        assert_eq!(g.edges[1].label, "is_a_very_long_rela...");
        assert_eq!(g.edges[0].relation_type, long_type);
    }

    #[test]
    fn meta_type_first_non_empty_wins() {
        let mut r1 = Relation::new("A", "x", "B", 0.1);
        r1.meta_type = Some("  ".into());
        let mut r2 = Relation::new("A", "x", "B", 0.1);
        r2.meta_type = Some("temporal".into());
        let mut r3 = Relation::new("A", "x", "B", 0.1);
        r3.meta_type = Some("causal".into());
        let g = build_graph(&subgraph(vec![r1, r2, r3], vec![]));
        assert_eq!(g.edges[0].meta_type.as_deref(), Some("temporal"));
    }

    #[test]
    fn missing_confidence_counts_as_zero() {
        let mut r = Relation::new("A", "x", "B", 0.0);
        r.confidence = None;
        let g = build_graph(&subgraph(vec![r, Relation::new("A", "x", "B", 0.6)], vec![]));
        assert!((g.edges[0].avg_confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn fact_matching_endpoint_stays_pinned() {
        let g = build_graph(&subgraph(
            vec![Relation::new("Alice", "likes", "Tea", 0.9)],
            vec![Fact::new(1, " Tea "), Fact::new(2, "")],
        ));
        assert_eq!(g.nodes.len(), 2);
        assert!(g.nodes.iter().all(|n| n.pinned));
    }

    #[test]
    fn edge_title() {
        let g = build_graph(&subgraph(
            vec![
                Relation::new("Alice", "likes", "Tea", 0.9),
                Relation::new("Alice", "likes", "Tea", 0.7),
            ],
            vec![],
        ));
        assert_eq!(g.edges[0].title, "likes, count: 2, conf: 0.80");
    }

    struct CaseInsensitive;

    impl EntityResolver for CaseInsensitive {
        fn resolve(&self, raw: &str) -> Option<String> {
            TextEntityResolver.resolve(raw).map(|s| s.to_lowercase())
        }
    }

    #[test]
    fn custom_resolver_changes_identity_only() {
        let sg = subgraph(
            vec![
                Relation::new("Alice", "knows", "Bob", 1.0),
                Relation::new("alice", "knows", "bob", 0.0),
            ],
            vec![],
        );
        assert_eq!(build_graph(&sg).edges.len(), 2);
        let g = build_graph_with(&sg, &CaseInsensitive);
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.edges.len(), 1);
        assert_eq!(g.edges[0].occurrence_count, 2);
    }
}
