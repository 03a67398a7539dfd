//! Memory-aware chat playground.
//!
//! Each turn recalls memories for the user's text, puts them in the system
//! prompt, asks the LLM, and queues both sides of the exchange for ingestion.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::types::Speaker;
use crate::api::ApiClient;
use crate::config::ChatConfig;
use crate::llm::{LlmClient, PromptMessage, Role};
use crate::tasks::{Job, TaskQueue, TaskStats};

const SYSTEM_INSTRUCTIONS: &str = "You are a helpful assistant with access to the user's memory system.\n\
Use the following recalled memories to inform your responses when relevant.\n\
If the memories are not relevant to the question, you may ignore them.\n";

const NO_RECALL: &str = "[No relevant memories recalled]";

/// Content type sent with the end-of-session buffer flush.
pub const FLUSH_CONTENT_TYPE: &str = "conversation";

/// Memories that informed an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecallContext {
    pub text: String,
    pub facts: u64,
    pub subgraphs: u64,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub recall: Option<RecallContext>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content: content.into(),
            recall: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether this is the `Error: ...` reply left by a failed turn.
    pub fn is_error(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with("Error: ")
    }
}

pub struct ChatSession {
    api: ApiClient,
    llm: LlmClient,
    settings: ChatConfig,
    tasks: TaskQueue,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Must be called inside a tokio runtime; spawns the ingestion worker.
    pub fn new(api: ApiClient, llm: LlmClient, settings: ChatConfig) -> Self {
        let tasks = TaskQueue::spawn(api.clone());
        Self {
            api,
            llm,
            settings,
            tasks,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Run one turn. Returns the assistant message appended for it, or `None`
    /// for blank input.
    pub async fn send(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // History is taken before the new message is appended; the new
        // message goes last in the prompt.
        let start = self.messages.len().saturating_sub(self.settings.history_window);
        let history: Vec<PromptMessage> = self.messages[start..]
            .iter()
            .map(|m| PromptMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();
        self.messages.push(ChatMessage::new(Role::User, text));

        let recall = match self.api.passive_recall(text).await {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(error = %e, "recall unavailable, continuing without memories");
                None
            }
        };
        let recall_text = recall.as_ref().map(|r| r.recall.trim()).unwrap_or_default();

        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(PromptMessage::system(system_prompt(recall_text)));
        prompt.extend(history);
        prompt.push(PromptMessage::user(text));

        let reply = match self
            .llm
            .complete(&prompt, self.settings.temperature, self.settings.max_tokens)
            .await
        {
            Ok(reply) => {
                let mut msg = ChatMessage::new(Role::Assistant, reply);
                msg.recall = recall.filter(|r| r.facts_count > 0).map(|r| RecallContext {
                    text: r.recall,
                    facts: r.facts_count,
                    subgraphs: r.subgraph_count,
                });
                self.tasks.enqueue(Job::Ingest {
                    text: text.to_string(),
                    speaker: Speaker::User,
                });
                self.tasks.enqueue(Job::Ingest {
                    text: msg.content.clone(),
                    speaker: Speaker::Agent,
                });
                msg
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat completion failed");
                ChatMessage::new(Role::Assistant, format!("Error: {e}"))
            }
        };

        self.messages.push(reply);
        self.messages.last()
    }

    /// End the session: queue a buffer flush and wait for queued writes.
    pub async fn close(mut self) -> TaskStats {
        self.tasks.enqueue(Job::Flush {
            content_type: FLUSH_CONTENT_TYPE.to_string(),
        });
        let stats = self.tasks.shutdown().await;
        tracing::info!(
            messages = self.messages.len(),
            completed = stats.completed,
            failed = stats.failed,
            "chat session closed"
        );
        stats
    }
}

fn system_prompt(recall: &str) -> String {
    if recall.is_empty() {
        format!("{SYSTEM_INSTRUCTIONS}\n{NO_RECALL}")
    } else {
        format!("{SYSTEM_INSTRUCTIONS}\n[Recalled Memories]\n{recall}")
    }
}
