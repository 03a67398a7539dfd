//! CLI `subgraphs`, `graph` and `summarize` commands.

use anyhow::{bail, Result};
use clap::ValueEnum;
use std::time::Duration;

use gauzmem::api::ApiClient;
use gauzmem::config::GauzConfig;
use gauzmem::graph::render::{DotRenderer, GraphRenderer, JsonRenderer, RenderTarget};
use gauzmem::graph::GraphData;
use gauzmem::llm::LlmClient;
use gauzmem::panel::{LoadOutcome, Pagination, RelationsPanel, RenderOutcome, SubgraphCard};
use gauzmem::summary::Summarizer;

/// Canvas size handed to renderers. The terminal has no layout pass, so the
/// size is known up front.
const CANVAS: RenderTarget = RenderTarget {
    width: 800,
    height: 420,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Json,
}

async fn load_page(client: &ApiClient, config: &GauzConfig, page: u32) -> Result<RelationsPanel> {
    let mut panel = RelationsPanel::new(config.console.page_size);
    if let LoadOutcome::Failed(message) = panel.load(client, page).await {
        bail!("failed to load subgraphs: {message}");
    }
    Ok(panel)
}

/// Load the page holding the card shown as `#index` and take that card.
async fn load_card(client: &ApiClient, config: &GauzConfig, index: usize) -> Result<SubgraphCard> {
    let Some((page, offset)) = Pagination::new(config.console.page_size).locate(index) else {
        bail!("subgraph index {index} is out of range (the first is #1)");
    };
    let mut panel = load_page(client, config, page).await?;

    let total = panel.total();
    match panel.card_mut(offset) {
        Some(card) => Ok(std::mem::replace(card, SubgraphCard::new(Default::default(), index))),
        None => bail!("no subgraph #{index} ({total} in total)"),
    }
}

/// List one page of subgraphs with a pagination footer.
pub async fn subgraphs(config: &GauzConfig, page: u32) -> Result<()> {
    let client = super::api_client(config)?;
    let panel = load_page(&client, config, page).await?;

    if panel.cards().is_empty() {
        println!("No relation subgraphs yet.");
        return Ok(());
    }

    for card in panel.cards() {
        let sg = card.subgraph();
        println!(
            "  #{}  {} fact(s), {} relation(s)",
            card.index(),
            sg.facts_count,
            sg.relations_count
        );
        if let Some(fact) = sg.facts.iter().find(|f| !f.content.trim().is_empty()) {
            println!("      {}", super::preview(&fact.content, 100));
        }
    }

    let p = panel.pagination();
    println!();
    println!("Page {} / {} ({} subgraphs)", p.page, p.total_pages().max(1), p.total);
    let mut hints = Vec::new();
    if let Some(prev) = p.prev_page() {
        hints.push(format!("prev: --page {prev}"));
    }
    if let Some(next) = p.next_page() {
        hints.push(format!("next: --page {next}"));
    }
    if !hints.is_empty() {
        println!("{}", hints.join("  "));
    }
    Ok(())
}

/// Build and draw the graph of subgraph `#index`.
pub async fn graph(config: &GauzConfig, index: usize, format: GraphFormat) -> Result<()> {
    let client = super::api_client(config)?;
    let mut card = load_card(&client, config, index).await?;
    card.toggle();

    let renderer: &dyn GraphRenderer = match format {
        GraphFormat::Text => {
            print_graph(card.graph_data());
            return Ok(());
        }
        GraphFormat::Dot => &DotRenderer,
        GraphFormat::Json => &JsonRenderer,
    };

    let delay = Duration::from_millis(config.console.render_delay_ms);
    match card.render_deferred(renderer, || CANVAS, delay).await? {
        RenderOutcome::Rendered | RenderOutcome::AlreadyRendered => {
            if let Some(output) = card.render_handle().and_then(|h| h.output()) {
                println!("{output}");
            }
        }
        RenderOutcome::NoEdges => println!("No relation edges to render."),
        RenderOutcome::Collapsed => {}
    }
    Ok(())
}

fn print_graph(graph: &GraphData) {
    println!("Nodes ({}):", graph.nodes.len());
    for n in &graph.nodes {
        let pin = if n.pinned { "*" } else { " " };
        println!("  {pin}{:<4} {:<28} degree {}", n.id, n.label, n.degree);
    }
    println!();
    if !graph.has_edges() {
        println!("No relation edges to render.");
        return;
    }
    println!("Edges ({}):", graph.edges.len());
    for e in &graph.edges {
        println!("  {} -> {}  [{}]  {}", e.from, e.to, e.label, e.title);
    }
}

/// Summarize subgraph `#index`, falling back to the template text on failure.
pub async fn summarize(config: &GauzConfig, index: usize) -> Result<()> {
    let client = super::api_client(config)?;
    let mut card = load_card(&client, config, index).await?;

    let llm = LlmClient::from_config(&config.llm)?;
    let summarizer = Summarizer::new(llm, config.summary.clone(), config.console.language);

    let pb = super::spinner("Generating memory paragraph...");
    let status = card.summarize(&summarizer).await;
    pb.finish_and_clear();

    if let Some(status) = status {
        println!("Subgraph #{index} [{status}]");
        println!("{}", "=".repeat(40));
        println!("{}", card.summary());
    }
    Ok(())
}
