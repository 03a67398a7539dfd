use anyhow::Result;

use gauzmem::api::types::HealthStatus;
use gauzmem::config::GauzConfig;

/// Print the backend health indicator.
pub async fn health(config: &GauzConfig) -> Result<()> {
    let client = super::api_client(config)?;
    let status = client.check_health().await;
    let marker = match status {
        HealthStatus::Healthy => "●",
        HealthStatus::Degraded => "◐",
        HealthStatus::Offline => "○",
    };
    println!("{marker} API {status} ({})", client.config().base_url);
    Ok(())
}

/// Display the dashboard overview in the terminal.
pub async fn stats(config: &GauzConfig) -> Result<()> {
    let client = super::api_client(config)?;
    let s = client.fetch_stats().await?;

    println!("Memory Overview ({})", client.config().project_id);
    println!("{}", "=".repeat(40));
    println!("  Facts:               {}", s.facts_count);
    println!("  Chunks:              {}", s.chunks_count);
    println!("  Sources:             {}", s.sources_count);
    println!("  Relations:           {}", s.relations_count);
    println!();

    println!("Uncomfortable score:");
    println!("  {:<12} {}", "high", s.uncomfortable_distribution.high);
    println!("  {:<12} {}", "medium", s.uncomfortable_distribution.medium);
    println!("  {:<12} {}", "low", s.uncomfortable_distribution.low);

    if !s.relation_types.is_empty() {
        println!();
        println!("Relation types:");
        for t in &s.relation_types {
            println!("  {:<24} {}", t.relation_type, t.count);
        }
    }

    if !s.facts_timeline.is_empty() {
        println!();
        println!("Facts per day:");
        for d in &s.facts_timeline {
            println!("  {}  {}", d.day, d.count);
        }
    }

    if !s.ingestion_timeline.is_empty() {
        println!();
        println!("Ingestion per day:");
        for d in &s.ingestion_timeline {
            println!("  {}  {}", d.day, d.count);
        }
    }

    Ok(())
}
