use anyhow::Result;

use gauzmem::config::GauzConfig;

/// Run a hybrid bundle search from the terminal.
pub async fn search(config: &GauzConfig, query: &str) -> Result<()> {
    let client = super::api_client(config)?;
    let bundles = client.search_bundles(query).await?;

    if bundles.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} bundle(s)\n", bundles.len());
    for (i, bundle) in bundles.iter().enumerate() {
        println!("  {}. (relevance: {:.4})", i + 1, bundle.relevance_score);
        for fact in &bundle.facts {
            println!("     fact:  {}", super::preview(&fact.content, 120));
        }
        for chunk in &bundle.chunks {
            println!("     chunk: {}", super::preview(&chunk.content, 120));
        }
        println!();
    }
    Ok(())
}

/// Print the natural-language recall for a query.
pub async fn recall(config: &GauzConfig, query: &str) -> Result<()> {
    let client = super::api_client(config)?;
    let result = client.passive_recall(query).await?;

    if result.recall.trim().is_empty() {
        println!("No relevant memories recalled.");
        return Ok(());
    }
    println!(
        "{} recall fragment(s), {} fact(s)\n",
        result.subgraph_count, result.facts_count
    );
    println!("{}", result.recall.trim());
    Ok(())
}
