//! Per-subgraph card state: expand/collapse, lazy graph data, deferred
//! rendering, and the summary sub-state.

use std::time::Duration;

use crate::api::types::Subgraph;
use crate::graph::render::{GraphRenderer, RenderError, RenderHandle, RenderTarget};
use crate::graph::{build_graph, GraphData};
use crate::summary::{SummarizationFailed, SummaryProvider, SummaryStatus};

/// Placeholder shown while the LLM is working.
pub const SUMMARY_PENDING_TEXT: &str = "Generating memory paragraph...";

/// What a render attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    /// A live handle already exists; nothing was redrawn.
    AlreadyRendered,
    /// The card is collapsed, so there is no container to draw into.
    Collapsed,
    /// Only isolated nodes; the card shows "no relation edges to render".
    NoEdges,
}

pub struct SubgraphCard {
    subgraph: Subgraph,
    /// 1-based position across all pages.
    index: usize,
    expanded: bool,
    graph: Option<GraphData>,
    handle: Option<Box<dyn RenderHandle>>,
    summary_status: SummaryStatus,
    summary: String,
}

impl std::fmt::Debug for SubgraphCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubgraphCard")
            .field("index", &self.index)
            .field("expanded", &self.expanded)
            .field("graph_built", &self.graph.is_some())
            .field("rendered", &self.handle.is_some())
            .field("summary_status", &self.summary_status)
            .finish()
    }
}

impl SubgraphCard {
    pub fn new(subgraph: Subgraph, index: usize) -> Self {
        Self {
            subgraph,
            index,
            expanded: false,
            graph: None,
            handle: None,
            summary_status: SummaryStatus::Idle,
            summary: String::new(),
        }
    }

    pub fn subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Flip between collapsed and expanded; returns the new state.
    ///
    /// Graph data is built on the first expansion and kept for the card's
    /// lifetime. Collapsing drops the rendered output but not the data.
    pub fn toggle(&mut self) -> bool {
        self.expanded = !self.expanded;
        if self.expanded {
            self.graph_data();
        } else if let Some(mut handle) = self.handle.take() {
            handle.dispose();
        }
        self.expanded
    }

    /// Graph data, built on first use.
    pub fn graph_data(&mut self) -> &GraphData {
        let subgraph = &self.subgraph;
        let index = self.index;
        self.graph.get_or_insert_with(|| {
            tracing::debug!(index, "building graph data");
            build_graph(subgraph)
        })
    }

    /// Graph data if it has been built already.
    pub fn cached_graph(&self) -> Option<&GraphData> {
        self.graph.as_ref()
    }

    pub fn render_handle(&self) -> Option<&dyn RenderHandle> {
        self.handle.as_deref()
    }

    /// Render once the container has had time to lay out.
    ///
    /// Waits `delay` before measuring `target`, so a freshly expanded card is
    /// not drawn into a zero-size container.
    pub async fn render_deferred(
        &mut self,
        renderer: &dyn GraphRenderer,
        target: impl Fn() -> RenderTarget,
        delay: Duration,
    ) -> Result<RenderOutcome, RenderError> {
        if !self.expanded {
            return Ok(RenderOutcome::Collapsed);
        }
        if self.handle.is_some() {
            return Ok(RenderOutcome::AlreadyRendered);
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let target = target();
        let graph = self.graph_data();
        if graph.nodes.is_empty() || !graph.has_edges() {
            return Ok(RenderOutcome::NoEdges);
        }
        let handle = renderer.render_graph(graph, &target)?;
        self.handle = Some(handle);
        Ok(RenderOutcome::Rendered)
    }

    pub fn summary_status(&self) -> SummaryStatus {
        self.summary_status
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Whether the summarize trigger is enabled.
    pub fn can_summarize(&self) -> bool {
        self.summary_status != SummaryStatus::Loading
    }

    /// Enter `loading`. Returns `false` (and changes nothing) if a request is
    /// already in flight.
    pub fn begin_summary(&mut self) -> bool {
        if !self.can_summarize() {
            return false;
        }
        self.summary_status = SummaryStatus::Loading;
        self.summary = SUMMARY_PENDING_TEXT.to_string();
        true
    }

    /// Settle a `loading` summary: `done` on success, `fallback` otherwise.
    pub fn finish_summary<P: SummaryProvider>(
        &mut self,
        result: Result<String, SummarizationFailed>,
        provider: &P,
    ) -> SummaryStatus {
        match result {
            Ok(text) => {
                self.summary = text;
                self.summary_status = SummaryStatus::Done;
            }
            Err(e) => {
                tracing::warn!(index = self.index, error = %e, "summarization failed, using fallback");
                self.summary = provider.fallback(&self.subgraph);
                self.summary_status = SummaryStatus::Fallback;
            }
        }
        self.summary_status
    }

    /// Run a full summarization. Returns `None` if one is already loading.
    /// Each call regenerates the summary; nothing is cached.
    pub async fn summarize<P: SummaryProvider>(&mut self, provider: &P) -> Option<SummaryStatus> {
        if !self.begin_summary() {
            return None;
        }
        let result = provider.summarize(&self.subgraph).await;
        Some(self.finish_summary(result, provider))
    }
}
