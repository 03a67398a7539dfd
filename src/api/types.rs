//! Wire types for the GauzMem backend API.
//!
//! Defines [`Fact`], [`Relation`], and [`Subgraph`] (the relation panel payload),
//! plus the stats, chunk, search, recall, and buffer response shapes. Field
//! names follow the backend's snake_case JSON; missing or `null` fields fall
//! back to defaults instead of failing the whole page.

use serde::{Deserialize, Deserializer, Serialize};

/// An atomic extracted statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "fact_id", default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// The "uncomfortable" relevance score in `[0.0, 1.0]`.
    #[serde(rename = "uncomfortable_score", default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_count: Option<u32>,
    /// Search terms that matched this fact (search/unresolved views only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
}

impl Fact {
    pub fn new(id: i64, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            ..Default::default()
        }
    }
}

/// A typed, directed link between two entities named by their text.
///
/// Entities have no stable id: identity is whatever the text says.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relation_type: String,
    /// `None` when the backend sent nothing usable (absent, null, non-numeric).
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
}

impl Relation {
    pub fn new(
        source: impl Into<String>,
        relation_type: impl Into<String>,
        target: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            source_content: source.into(),
            target_content: target.into(),
            relation_type: relation_type.into(),
            confidence: Some(confidence),
            meta_type: None,
        }
    }

    /// Confidence with the 0.0 default applied.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }
}

/// A server-delimited cluster of related facts and relations.
///
/// `facts_count` / `relations_count` are server-side totals and may exceed
/// the lengths of the arrays actually returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    #[serde(default, deserialize_with = "null_as_default")]
    pub facts: Vec<Fact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Vec<Relation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub facts_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations_count: u64,
}

/// One page of subgraphs plus the server-reported total.
#[derive(Debug, Clone, Default)]
pub struct SubgraphPage {
    pub subgraphs: Vec<Subgraph>,
    pub total: u64,
}

/// One page of facts plus the server-reported total.
#[derive(Debug, Clone, Default)]
pub struct FactPage {
    pub facts: Vec<Fact>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: i64,
    #[serde(default)]
    pub turn: Option<String>,
    #[serde(default)]
    pub text_preview: String,
    #[serde(default)]
    pub text_length: u64,
    #[serde(default)]
    pub facts_count: u64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreDistribution {
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub low: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: u64,
}

/// Response from the dashboard stats endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub facts_count: u64,
    pub chunks_count: u64,
    pub sources_count: u64,
    pub relations_count: u64,
    pub uncomfortable_distribution: ScoreDistribution,
    pub relation_types: Vec<TypeCount>,
    pub ingestion_timeline: Vec<DayCount>,
    pub facts_timeline: Vec<DayCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub content: String,
}

/// A search hit: a group of facts and chunks with one relevance score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBundle {
    pub relevance_score: f64,
    pub facts: Vec<ContentItem>,
    pub chunks: Vec<ContentItem>,
}

/// Passive recall: natural-language memory context for a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallResult {
    pub recall: String,
    pub facts_count: u64,
    pub subgraph_count: u64,
}

/// Three-state backend health indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Offline,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who said an ingested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushResult {
    pub flushed: bool,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accept a number, a numeric string, or anything else (mapped to `None`).
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_confidence_is_lenient() {
        let rels: Vec<Relation> = serde_json::from_str(
            r#"[
                {"source_content":"A","target_content":"B","relation_type":"x","confidence":0.5},
                {"source_content":"A","target_content":"B","relation_type":"x","confidence":"0.25"},
                {"source_content":"A","target_content":"B","relation_type":"x","confidence":"high"},
                {"source_content":"A","target_content":"B","relation_type":"x","confidence":null},
                {"source_content":"A","target_content":"B","relation_type":"x"}
            ]"#,
        )
        .unwrap();
        let confs: Vec<Option<f64>> = rels.iter().map(|r| r.confidence).collect();
        assert_eq!(confs, vec![Some(0.5), Some(0.25), None, None, None]);
        assert_eq!(rels[2].confidence_or_zero(), 0.0);
    }

    #[test]
    fn fact_uses_backend_field_names() {
        let fact: Fact = serde_json::from_str(
            r#"{"fact_id": 7, "content": "Alice likes tea", "uncomfortable_score": 0.42, "relation_count": 3}"#,
        )
        .unwrap();
        assert_eq!(fact.id, 7);
        assert_eq!(fact.score, 0.42);
        assert_eq!(fact.relation_count, Some(3));
        assert!(fact.created_at.is_none());
    }

    #[test]
    fn subgraph_tolerates_missing_arrays() {
        let sg: Subgraph = serde_json::from_str(r#"{"facts_count": 12, "relations_count": 30}"#).unwrap();
        assert!(sg.facts.is_empty());
        assert!(sg.relations.is_empty());
        assert_eq!(sg.facts_count, 12);
    }

    #[test]
    fn subgraph_tolerates_null_fields() {
        let sg: Subgraph = serde_json::from_str(
            r#"{
                "facts": null,
                "relations": [
                    {"source_content": null, "target_content": "Tea", "relation_type": "likes"},
                    {"source_content": "Alice", "target_content": "Tea", "relation_type": null, "confidence": null}
                ],
                "facts_count": null,
                "relations_count": 2
            }"#,
        )
        .unwrap();
        assert!(sg.facts.is_empty());
        assert_eq!(sg.facts_count, 0);
        assert_eq!(sg.relations[0].source_content, "");
        assert_eq!(sg.relations[1].relation_type, "");
        assert_eq!(sg.relations[1].confidence, None);

        let fact: Fact =
            serde_json::from_str(r#"{"fact_id": 3, "content": null, "uncomfortable_score": null}"#).unwrap();
        assert_eq!(fact.content, "");
        assert_eq!(fact.score, 0.0);
    }

    #[test]
    fn flush_result_defaults_to_not_flushed() {
        let r: FlushResult = serde_json::from_str("{}").unwrap();
        assert!(!r.flushed);
    }
}
