mod helpers;

use gauzmem::api::types::Relation;
use gauzmem::graph::render::{
    DotRenderer, GraphRenderer, JsonRenderer, RenderError, RenderTarget,
};
use gauzmem::graph::{
    build_graph, build_graph_with, node_size, EntityResolver, DEFAULT_RELATION_TYPE,
    NODE_MAX_SIZE,
};
use helpers::{alice_tea, relation, subgraph};

#[test]
fn same_text_gets_same_node_regardless_of_whitespace() {
    let sg = subgraph(
        &[],
        vec![
            relation("Bob", "knows", "Carol", 0.5),
            relation("  Alice ", "knows", "Dave", 0.5),
            relation("Alice", "likes", "Carol\t", 0.5),
        ],
    );
    let g = build_graph(&sg);

    assert_eq!(g.nodes.len(), 4);
    let alice = g.node_by_text("Alice").unwrap();
    let carol = g.node_by_text("Carol").unwrap();
    assert_eq!(g.edges[1].from, alice.id);
    assert_eq!(g.edges[2].from, alice.id);
    assert_eq!(g.edges[0].to, carol.id);
    assert_eq!(g.edges[2].to, carol.id);
}

#[test]
fn repeated_relations_collapse_per_type() {
    let sg = subgraph(
        &[],
        vec![
            relation("A", "X", "B", 0.4),
            relation("A", "X", "B", 0.8),
            relation("A", "Y", "B", 1.0),
        ],
    );
    let g = build_graph(&sg);

    assert_eq!(g.edges.len(), 2);
    let x = g.edges.iter().find(|e| e.relation_type == "X").unwrap();
    let y = g.edges.iter().find(|e| e.relation_type == "Y").unwrap();
    assert_eq!(x.occurrence_count, 2);
    assert!((x.avg_confidence - 0.6).abs() < 1e-9);
    assert_eq!(x.label, "X x2");
    assert_eq!(y.occurrence_count, 1);
    assert_eq!(y.label, "Y");

    // Degree counts relations, not collapsed edges.
    assert_eq!(g.node_by_text("A").unwrap().degree, 3);
}

#[test]
fn blank_endpoint_skips_the_relation() {
    let sg = subgraph(
        &[],
        vec![
            relation("", "likes", "Tea", 0.9),
            relation("Alice", "likes", "   ", 0.9),
        ],
    );
    let g = build_graph(&sg);
    assert!(g.nodes.is_empty());
    assert!(g.edges.is_empty());
}

#[test]
fn self_loop_is_kept() {
    let sg = subgraph(&[], vec![relation("Alice", "mentions", " Alice ", 0.5)]);
    let g = build_graph(&sg);

    assert_eq!(g.nodes.len(), 1);
    assert_eq!(g.edges.len(), 1);
    assert_eq!(g.edges[0].from, g.edges[0].to);
    assert_eq!(g.nodes[0].degree, 2);
}

#[test]
fn node_size_is_monotonic_and_capped() {
    let mut last = 0.0;
    for degree in [0, 1, 2, 5, 8, 9, 50, 1000, u32::MAX] {
        let size = node_size(degree);
        assert!(size >= last);
        assert!(size <= NODE_MAX_SIZE);
        last = size;
    }
    assert_eq!(node_size(1000), NODE_MAX_SIZE);
}

#[test]
fn alice_tea_scenario() {
    let g = build_graph(&alice_tea());

    assert_eq!(g.nodes.len(), 3);
    let alice = g.node_by_text("Alice").unwrap();
    let tea = g.node_by_text("Tea").unwrap();
    let fact = g.node_by_text("Alice likes tea").unwrap();
    assert!(alice.pinned && tea.pinned);
    assert!(!fact.pinned);
    assert_eq!(fact.degree, 0);
    assert_eq!((alice.id.as_str(), tea.id.as_str(), fact.id.as_str()), ("n1", "n2", "n3"));

    assert_eq!(g.edges.len(), 1);
    let edge = &g.edges[0];
    assert_eq!(edge.id, "e1");
    assert_eq!(edge.occurrence_count, 2);
    assert!((edge.avg_confidence - 0.8).abs() < 1e-9);
    assert_eq!(edge.title, "likes, count: 2, conf: 0.80");
}

#[test]
fn fact_matching_an_entity_is_not_duplicated() {
    let sg = subgraph(&["Alice", "  Tea  "], vec![relation("Alice", "likes", "Tea", 0.9)]);
    let g = build_graph(&sg);
    assert_eq!(g.nodes.len(), 2);
    assert!(g.nodes.iter().all(|n| n.pinned));
}

#[test]
fn missing_confidence_and_blank_type_use_defaults() {
    let mut r = relation("A", "  ", "B", 0.0);
    r.confidence = None;
    let g = build_graph(&subgraph(&[], vec![r]));

    assert_eq!(g.edges[0].relation_type, DEFAULT_RELATION_TYPE);
    assert_eq!(g.edges[0].avg_confidence, 0.0);
    assert_eq!(g.edges[0].width, 1.0);
}

#[test]
fn first_non_empty_meta_type_wins() {
    let mut a = relation("A", "x", "B", 0.5);
    a.meta_type = Some(" ".into());
    let mut b = relation("A", "x", "B", 0.5);
    b.meta_type = Some("plan".into());
    let mut c = relation("A", "x", "B", 0.5);
    c.meta_type = Some("event".into());

    let g = build_graph(&subgraph(&[], vec![a, b, c]));
    assert_eq!(g.edges[0].meta_type.as_deref(), Some("plan"));
}

#[test]
fn long_labels_are_truncated_but_full_text_is_kept() {
    let long = "Alice the principal engineer of the payments team";
    let g = build_graph(&subgraph(&[], vec![relation(long, "works_on", "Ledger", 0.9)]));
    let node = g.node_by_text(long).unwrap();
    assert_eq!(node.label.chars().count(), 26);
    assert!(node.label.ends_with("..."));
    assert_eq!(node.full_text, long);
}

struct CaseFolding;

impl EntityResolver for CaseFolding {
    fn resolve(&self, raw: &str) -> Option<String> {
        let key = raw.trim().to_lowercase();
        (!key.is_empty()).then_some(key)
    }
}

#[test]
fn custom_resolver_controls_identity() {
    let sg = subgraph(
        &[],
        vec![
            relation("Alice", "likes", "Tea", 0.9),
            relation("ALICE", "likes", "tea", 0.7),
        ],
    );
    let g = build_graph_with(&sg, &CaseFolding);
    assert_eq!(g.nodes.len(), 2);
    assert_eq!(g.edges.len(), 1);
    assert_eq!(g.edges[0].occurrence_count, 2);
}

#[test]
fn facts_only_subgraph_has_nothing_to_draw() {
    let g = build_graph(&subgraph(&["one", "two"], Vec::<Relation>::new()));
    assert_eq!(g.nodes.len(), 2);
    assert!(!g.has_edges());

    let target = RenderTarget::new(600, 320);
    assert!(matches!(DotRenderer.render_graph(&g, &target), Err(RenderError::NoEdges)));
    assert!(matches!(JsonRenderer.render_graph(&g, &target), Err(RenderError::NoEdges)));
}

#[test]
fn renderers_draw_the_alice_tea_graph() {
    let g = build_graph(&alice_tea());
    let target = RenderTarget::new(600, 320);

    let dot = DotRenderer.render_graph(&g, &target).unwrap();
    let text = dot.output().unwrap();
    assert!(text.contains("n1 -> n2"));

    let json = JsonRenderer.render_graph(&g, &target).unwrap();
    let v: serde_json::Value = serde_json::from_str(json.output().unwrap()).unwrap();
    assert_eq!(v["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(v["edges"][0]["label"], "likes x2");
}
