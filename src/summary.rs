//! Memory summarization for relation subgraphs.
//!
//! [`Summarizer`] asks the LLM for a recall-style paragraph. Any failure on
//! that path (transport, non-2xx, timeout, empty completion) is reported as
//! the single [`SummarizationFailed`] error, and callers fall back to
//! [`fallback_summary`], which is deterministic and cannot fail.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::types::Subgraph;
use crate::config::SummaryConfig;
use crate::graph::{truncate, DEFAULT_RELATION_TYPE};
use crate::llm::{LlmClient, PromptMessage};

/// Per-fact character budget inside the prompt.
const PROMPT_FACT_CHARS: usize = 220;
/// Per-endpoint character budget inside the prompt.
const PROMPT_ENTITY_CHARS: usize = 120;
/// Facts quoted in the fallback lead sentence.
const FALLBACK_FACTS: usize = 3;
/// Relation types named in the fallback qualifier.
const FALLBACK_TOP_TYPES: usize = 3;

/// Display language. Persisted across sessions in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "zh" => Ok(Self::Zh),
            _ => Err(format!("unknown language: {s} (expected en or zh)")),
        }
    }
}

/// The LLM path did not produce a usable summary. The cause is kept only for logs.
#[derive(Debug, thiserror::Error)]
#[error("summarization failed: {0}")]
pub struct SummarizationFailed(pub String);

/// Where a card's summary currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    #[default]
    Idle,
    Loading,
    Done,
    Fallback,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can summarize a subgraph.
#[allow(async_fn_in_trait)]
pub trait SummaryProvider {
    async fn summarize(&self, subgraph: &Subgraph) -> Result<String, SummarizationFailed>;

    /// Text used when [`SummaryProvider::summarize`] fails.
    fn fallback(&self, subgraph: &Subgraph) -> String {
        fallback_summary(subgraph, Language::En)
    }
}

/// LLM-backed summarizer.
#[derive(Clone)]
pub struct Summarizer {
    llm: LlmClient,
    settings: SummaryConfig,
    language: Language,
}

impl Summarizer {
    pub fn new(llm: LlmClient, settings: SummaryConfig, language: Language) -> Self {
        Self {
            llm,
            settings,
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Summarize with the LLM, falling back to the deterministic text.
    /// Returns the text and whether the fallback was used.
    pub async fn summarize_or_fallback(&self, subgraph: &Subgraph) -> (String, SummaryStatus) {
        match SummaryProvider::summarize(self, subgraph).await {
            Ok(text) => (text, SummaryStatus::Done),
            Err(e) => {
                tracing::warn!(error = %e, "using fallback summary");
                (self.fallback(subgraph), SummaryStatus::Fallback)
            }
        }
    }
}

impl SummaryProvider for Summarizer {
    async fn summarize(&self, subgraph: &Subgraph) -> Result<String, SummarizationFailed> {
        let prompt = build_summary_prompt(
            subgraph,
            self.settings.max_facts,
            self.settings.max_relations,
            self.language,
        );
        let messages = [
            PromptMessage::system(system_prompt(self.language)),
            PromptMessage::user(prompt),
        ];

        self.llm
            .complete(&messages, self.settings.temperature, self.settings.max_tokens)
            .await
            .map_err(|e| SummarizationFailed(e.to_string()))
    }

    fn fallback(&self, subgraph: &Subgraph) -> String {
        fallback_summary(subgraph, self.language)
    }
}

fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::Zh => "你是记忆归纳助手，只做忠实改写。",
        Language::En => {
            "You are a memory consolidation assistant. Rephrase faithfully and never invent details."
        }
    }
}

/// Build the user prompt from at most `max_facts` facts and `max_relations` relations.
pub fn build_summary_prompt(
    subgraph: &Subgraph,
    max_facts: usize,
    max_relations: usize,
    language: Language,
) -> String {
    let facts_text = subgraph
        .facts
        .iter()
        .take(max_facts)
        .enumerate()
        .map(|(i, f)| format!("{}. {}", i + 1, truncate(&f.content, PROMPT_FACT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");

    let relations_text = subgraph
        .relations
        .iter()
        .take(max_relations)
        .enumerate()
        .map(|(i, r)| {
            let relation_type = match r.relation_type.trim() {
                "" => DEFAULT_RELATION_TYPE,
                t => t,
            };
            format!(
                "{}. [{}] {} -> {}",
                i + 1,
                relation_type,
                truncate(&r.source_content, PROMPT_ENTITY_CHARS),
                truncate(&r.target_content, PROMPT_ENTITY_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let header: &[&str] = match language {
        Language::Zh => &[
            "根据下面记忆子图，写一段\"回忆式总结\"。",
            "要求：",
            "- 只输出一个自然段，中文，100~220字。",
            "- 要忠实于事实，不要添加未出现的信息。",
            "- 要把核心计划、时间点、动作和结论说清楚。",
        ],
        Language::En => &[
            "Write a recall-style summary of the memory subgraph below.",
            "Requirements:",
            "- Output a single paragraph in English, 80-180 words.",
            "- Stay faithful to the facts; do not add anything that is not present.",
            "- Make the core plans, time points, actions, and conclusions clear.",
        ],
    };

    let mut lines: Vec<String> = header.iter().map(|s| s.to_string()).collect();
    lines.push(String::new());
    lines.push(format!(
        "facts_count={}, relations_count={}",
        subgraph.facts_count, subgraph.relations_count
    ));
    lines.push(String::new());
    lines.push("[FACTS]".into());
    lines.push(if facts_text.is_empty() { "(none)".into() } else { facts_text });
    lines.push(String::new());
    lines.push("[RELATIONS]".into());
    lines.push(if relations_text.is_empty() { "(none)".into() } else { relations_text });
    lines.join("\n")
}

/// Deterministic summary: a lead from the first non-empty facts plus the most
/// common relation types. Always returns non-empty text.
pub fn fallback_summary(subgraph: &Subgraph, language: Language) -> String {
    let facts: Vec<&str> = subgraph
        .facts
        .iter()
        .map(|f| f.content.trim())
        .filter(|c| !c.is_empty())
        .take(FALLBACK_FACTS)
        .collect();

    // First-seen order breaks ties.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for relation in &subgraph.relations {
        let relation_type = match relation.relation_type.trim() {
            "" => DEFAULT_RELATION_TYPE,
            t => t,
        };
        match slot.get(relation_type) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(relation_type, counts.len());
                counts.push((relation_type, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let top_types = if counts.is_empty() {
        DEFAULT_RELATION_TYPE.to_string()
    } else {
        counts
            .iter()
            .take(FALLBACK_TOP_TYPES)
            .map(|(t, n)| format!("{t}:{n}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match language {
        Language::Zh => {
            let lead = if facts.is_empty() {
                "这是一组围绕同一主题的关联记忆".to_string()
            } else {
                format!("核心内容包括：{}", facts.join("；"))
            };
            format!(
                "{lead}。整体关系以 {top_types} 为主，说明这段讨论主要在做计划拆解、信息补充与决策确认。"
            )
        }
        Language::En => {
            let lead = if facts.is_empty() {
                "This is a group of related memories around a shared topic".to_string()
            } else {
                format!("Key points: {}", facts.join("; "))
            };
            format!(
                "{lead}. Relations are dominated by {top_types}, so the discussion mostly breaks down plans and confirms decisions."
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Fact, Relation};

    #[test]
    fn fallback_uses_first_three_non_empty_facts() {
        let sg = Subgraph {
            facts: vec![
                Fact::new(1, "  "),
                Fact::new(2, "Plan the trip"),
                Fact::new(3, "Book flights"),
                Fact::new(4, ""),
                Fact::new(5, "Reserve hotel"),
                Fact::new(6, "Pack bags"),
            ],
            ..Default::default()
        };
        let text = fallback_summary(&sg, Language::En);
        assert!(text.starts_with("Key points: Plan the trip; Book flights; Reserve hotel."));
        assert!(!text.contains("Pack bags"));
        assert!(text.contains("dominated by related_to"));
    }

    #[test]
    fn fallback_top_types_by_count() {
        let sg = Subgraph {
            relations: vec![
                Relation::new("a", "knows", "b", 0.1),
                Relation::new("a", "likes", "b", 0.1),
                Relation::new("a", "likes", "c", 0.1),
                Relation::new("a", "owns", "b", 0.1),
                Relation::new("a", "", "b", 0.1),
                Relation::new("a", "likes", "d", 0.1),
                Relation::new("a", "owns", "d", 0.1),
            ],
            ..Default::default()
        };
        let text = fallback_summary(&sg, Language::En);
        assert!(text.contains("likes:3, owns:2, knows:1"), "{text}");
    }

    #[test]
    fn fallback_chinese_template() {
        let sg = Subgraph {
            facts: vec![Fact::new(1, "周五发布 v2.3")],
            relations: vec![Relation::new("发布", "depends_on", "测试", 0.8)],
            ..Default::default()
        };
        assert_eq!(
            fallback_summary(&sg, Language::Zh),
            "核心内容包括：周五发布 v2.3。整体关系以 depends_on:1 为主，说明这段讨论主要在做计划拆解、信息补充与决策确认。"
        );
    }

    #[test]
    fn fallback_never_empty() {
        let empty = Subgraph::default();
        for lang in [Language::En, Language::Zh] {
            assert!(!fallback_summary(&empty, lang).trim().is_empty());
        }
    }

    #[test]
    fn prompt_truncates_payload() {
        let sg = Subgraph {
            facts: (0..100).map(|i| Fact::new(i, format!("fact {i}"))).collect(),
            relations: (0..200)
                .map(|i| Relation::new(format!("s{i}"), "", format!("t{i}"), 0.5))
                .collect(),
            facts_count: 150,
            relations_count: 300,
        };
        let prompt = build_summary_prompt(&sg, 40, 80, Language::En);
        assert!(prompt.contains("40. fact 39"));
        assert!(!prompt.contains("fact 40"));
        assert!(prompt.contains("80. [related_to] s79 -> t79"));
        assert!(!prompt.contains("s80"));
        assert!(prompt.contains("facts_count=150, relations_count=300"));
    }

    #[test]
    fn prompt_marks_empty_sections() {
        let prompt = build_summary_prompt(&Subgraph::default(), 40, 80, Language::Zh);
        assert!(prompt.starts_with("根据下面记忆子图"));
        assert_eq!(prompt.matches("(none)").count(), 2);
    }

    #[test]
    fn language_parse() {
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
    }
}
