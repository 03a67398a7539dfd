//! Pluggable graph renderers.
//!
//! The builder only produces data; drawing it is a capability handed in from
//! outside through [`GraphRenderer`]. A render returns a [`RenderHandle`] that
//! owns the drawn output until it is disposed.

use serde_json::json;

use super::{GraphData, GraphEdge, GraphNode};

const PINNED_FILL: &str = "#7c8cff";
const PINNED_BORDER: &str = "#9ca7ff";
const LOOSE_FILL: &str = "#4f566f";
const LOOSE_BORDER: &str = "#717ba3";
const EDGE_COLOR: &str = "#6c7bff";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RenderError {
    #[error("no relation edges to render")]
    NoEdges,
    #[error("render container has zero size ({width}x{height})")]
    ZeroSizeContainer { width: u32, height: u32 },
    #[error("failed to encode graph: {0}")]
    Encode(String),
}

/// Where a graph gets drawn. A zero-size target has not been laid out yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_measured(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Live output of a render.
pub trait RenderHandle: Send {
    /// The drawn output, or `None` once disposed.
    fn output(&self) -> Option<&str>;
    /// Release the output. Idempotent.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool {
        self.output().is_none()
    }
}

/// A drawing engine for [`GraphData`].
pub trait GraphRenderer {
    fn render(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        target: &RenderTarget,
    ) -> Result<Box<dyn RenderHandle>, RenderError>;

    fn render_graph(
        &self,
        graph: &GraphData,
        target: &RenderTarget,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        self.render(&graph.nodes, &graph.edges, target)
    }
}

/// Handle that owns a rendered text document.
#[derive(Debug)]
pub struct RenderedText {
    output: Option<String>,
}

impl RenderedText {
    pub fn new(output: String) -> Self {
        Self {
            output: Some(output),
        }
    }
}

impl RenderHandle for RenderedText {
    fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    fn dispose(&mut self) {
        self.output = None;
    }
}

fn check_drawable(edges: &[GraphEdge], target: &RenderTarget) -> Result<(), RenderError> {
    if !target.is_measured() {
        return Err(RenderError::ZeroSizeContainer {
            width: target.width,
            height: target.height,
        });
    }
    if edges.is_empty() {
        return Err(RenderError::NoEdges);
    }
    Ok(())
}

/// Graphviz DOT output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl GraphRenderer for DotRenderer {
    fn render(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        target: &RenderTarget,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        check_drawable(edges, target)?;

        let mut out = String::from("digraph memory {\n");
        // Graphviz sizes are inches at 72dpi.
        out.push_str(&format!(
            "  graph [size=\"{:.1},{:.1}\", overlap=false];\n",
            f64::from(target.width) / 72.0,
            f64::from(target.height) / 72.0
        ));
        out.push_str("  node [shape=circle, style=filled, fontsize=12];\n");
        for node in nodes {
            let (fill, border) = if node.pinned {
                (PINNED_FILL, PINNED_BORDER)
            } else {
                (LOOSE_FILL, LOOSE_BORDER)
            };
            out.push_str(&format!(
                "  {} [label=\"{}\", tooltip=\"{}\", width={:.2}, fillcolor=\"{}\", color=\"{}\"];\n",
                node.id,
                escape_dot(&node.label),
                escape_dot(&node.full_text),
                node.size / 28.0,
                fill,
                border
            ));
        }
        for edge in edges {
            out.push_str(&format!(
                "  {} -> {} [label=\"{}\", tooltip=\"{}\", penwidth={:.2}, color=\"{}\"];\n",
                edge.from,
                edge.to,
                escape_dot(&edge.label),
                escape_dot(&edge.title),
                edge.width,
                EDGE_COLOR
            ));
        }
        out.push_str("}\n");

        Ok(Box::new(RenderedText::new(out)))
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// vis-network `{nodes, edges}` JSON with the dashboard's styling applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl GraphRenderer for JsonRenderer {
    fn render(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        target: &RenderTarget,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        check_drawable(edges, target)?;

        let nodes: Vec<_> = nodes
            .iter()
            .map(|n| {
                let (fill, border) = if n.pinned {
                    (PINNED_FILL, PINNED_BORDER)
                } else {
                    (LOOSE_FILL, LOOSE_BORDER)
                };
                json!({
                    "id": n.id,
                    "label": n.label,
                    "title": n.full_text,
                    "shape": "dot",
                    "size": n.size,
                    "color": { "background": fill, "border": border },
                    "font": { "color": "#d8dced", "size": 12 },
                })
            })
            .collect();
        let edges: Vec<_> = edges
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "from": e.from,
                    "to": e.to,
                    "label": e.label,
                    "arrows": "to",
                    "width": e.width,
                    "title": e.title,
                    "color": { "color": EDGE_COLOR, "opacity": 0.7 },
                })
            })
            .collect();

        let doc = json!({
            "width": target.width,
            "height": target.height,
            "nodes": nodes,
            "edges": edges,
        });
        let out = serde_json::to_string_pretty(&doc).map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(Box::new(RenderedText::new(out)))
    }
}
