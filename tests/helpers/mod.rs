#![allow(dead_code)]

use std::time::Duration;

use gauzmem::api::types::{Fact, Relation, Subgraph};
use gauzmem::api::{ApiClient, ApiConfig};
use gauzmem::llm::LlmClient;
use serde_json::{json, Value};

pub const PROJECT: &str = "test_project";

pub fn relation(source: &str, relation_type: &str, target: &str, confidence: f64) -> Relation {
    Relation::new(source, relation_type, target, confidence)
}

/// Subgraph whose counts match the arrays it carries.
pub fn subgraph(facts: &[&str], relations: Vec<Relation>) -> Subgraph {
    Subgraph {
        facts: facts
            .iter()
            .enumerate()
            .map(|(i, c)| Fact::new(i as i64 + 1, *c))
            .collect(),
        facts_count: facts.len() as u64,
        relations_count: relations.len() as u64,
        relations,
    }
}

/// The Alice/Tea fixture: one fact, the same relation twice.
pub fn alice_tea() -> Subgraph {
    subgraph(
        &["Alice likes tea"],
        vec![
            relation("Alice", "likes", "Tea", 0.9),
            relation("Alice", "likes", "Tea", 0.7),
        ],
    )
}

/// Backend client pointed at `base` (usually a mock server URI).
pub fn api_client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig::new(base, PROJECT), Duration::from_secs(5)).unwrap()
}

pub fn llm_client(base: &str, timeout: Duration) -> LlmClient {
    LlmClient::new(base, "test-model", "sk-test", timeout).unwrap()
}

/// An OpenAI-style completion body with a single choice.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "cmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

/// A `/subgraphs` response body holding `count` single-relation subgraphs.
pub fn subgraphs_body(count: usize, total: u64) -> Value {
    let subgraphs: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "facts": [{ "fact_id": i + 1, "content": format!("fact {i}") }],
                "relations": [{
                    "source_content": format!("S{i}"),
                    "target_content": format!("T{i}"),
                    "relation_type": "links",
                    "confidence": 0.5
                }],
                "facts_count": 1,
                "relations_count": 1
            })
        })
        .collect();
    json!({ "success": true, "subgraphs": subgraphs, "total": total })
}
