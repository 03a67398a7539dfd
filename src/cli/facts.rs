//! CLI `facts` and `chunks` commands.

use anyhow::Result;

use gauzmem::api::FACTS_PAGE_SIZE;
use gauzmem::config::GauzConfig;

/// List one page of facts, or every unresolved fact.
pub async fn facts(
    config: &GauzConfig,
    page: u32,
    sort: &str,
    min_score: &str,
    unresolved: bool,
) -> Result<()> {
    let client = super::api_client(config)?;
    let result = if unresolved {
        client.fetch_unresolved().await?
    } else {
        client.fetch_facts(page.max(1), sort, min_score).await?
    };

    if result.facts.is_empty() {
        println!("No facts found.");
        return Ok(());
    }

    for fact in &result.facts {
        let relations = fact
            .relation_count
            .map(|n| format!(", relations: {n}"))
            .unwrap_or_default();
        println!(
            "  [{}] {} (score: {:.2}{})",
            fact.id,
            super::preview(&fact.content, 120),
            fact.score,
            relations,
        );
    }
    println!();

    if unresolved {
        println!("{} unresolved fact(s)", result.total);
    } else {
        let pages = result.total.div_ceil(u64::from(FACTS_PAGE_SIZE)).max(1);
        println!("Page {} / {} ({} facts)", page.max(1), pages, result.total);
    }
    Ok(())
}

/// List chunks, or the facts extracted from one chunk.
pub async fn chunks(config: &GauzConfig, chunk_id: Option<i64>) -> Result<()> {
    let client = super::api_client(config)?;

    if let Some(id) = chunk_id {
        let facts = client.fetch_chunk_facts(id).await?;
        println!("Chunk {id}: {} fact(s)", facts.len());
        for fact in &facts {
            println!("  - {}", super::preview(&fact.content, 120));
        }
        return Ok(());
    }

    let chunks = client.fetch_chunks().await?;
    if chunks.is_empty() {
        println!("No chunks found.");
        return Ok(());
    }
    for c in &chunks {
        println!(
            "  {}. [{}] {} chars, {} fact(s), {}",
            c.chunk_id,
            c.turn.as_deref().unwrap_or("-"),
            c.text_length,
            c.facts_count,
            c.created_at,
        );
        println!("     {}", super::preview(&c.text_preview, 120));
    }
    Ok(())
}
