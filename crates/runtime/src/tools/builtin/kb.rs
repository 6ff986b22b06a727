//! Knowledge base lookup.
//!
//! Lookup is a fallback chain: a direct name match, then (when a model is
//! configured) a model-assisted match, then the [`NOT_FOUND`] sentinel.
//! Not finding anything is never an error.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::Backend;
use crate::tools::{KB, Tool, ToolArgs, ToolError, ToolSchema};

pub const NOT_FOUND: &str = "No entry found.";
pub const EMPTY_KNOWLEDGE_BASE: &str = "Knowledge base is empty.";

const NO_MATCH: &str = "NO_MATCH";

static QUESTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(who is|what is)\s+").expect("valid prefix pattern"));
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));

/// A knowledge base entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
}

impl Entry {
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Store {
    #[serde(default)]
    entries: Vec<Entry>,
}

fn read_store(path: &Path) -> Result<Vec<Entry>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let store: Store = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    Ok(store.entries)
}

fn clean_query(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped = QUESTION_PREFIX.replace(&lowered, "");
    PUNCTUATION.replace_all(&stripped, "").trim().to_string()
}

/// The `kb` tool: a read-only store of name/summary entries.
pub struct KnowledgeBase<B> {
    entries: Vec<Entry>,
    model: Option<Arc<B>>,
}

impl<B: Backend> KnowledgeBase<B> {
    pub fn new(entries: Vec<Entry>, model: Option<Arc<B>>) -> Self {
        Self { entries, model }
    }

    /// Load entries from a JSON file. An unreadable file gives an empty store.
    pub fn load(path: &Path, model: Option<Arc<B>>) -> Self {
        let entries = match read_store(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "knowledge base unavailable, starting empty");
                Vec::new()
            }
        };
        Self::new(entries, model)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// First entry whose name contains the cleaned query, ignoring case.
    pub fn direct_match(&self, query: &str) -> Option<&Entry> {
        let cleaned = clean_query(query);
        if cleaned.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.name.to_lowercase().contains(&cleaned))
    }

    async fn model_match(&self, model: &B, question: &str) -> Option<&Entry> {
        let listing = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{i}: {} - {}", entry.name, entry.summary))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are a knowledge base search assistant.\n\n\
             User question: \"{question}\"\n\n\
             Available knowledge base entries:\n{listing}\n\n\
             Find the entry most relevant to the user's question. Accept partial \
             matches, related concepts and spelling variations of names.\n\
             Reply with only the entry's index number, or {NO_MATCH} if no entry is relevant."
        );

        let reply = match model.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "knowledge base model search failed");
                return None;
            }
        };

        let reply = reply.trim();
        debug!(reply, "knowledge base model search reply");
        if reply == NO_MATCH {
            return None;
        }
        reply
            .parse::<usize>()
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    /// Answer `query`, using `question` for the model-assisted tier.
    pub async fn lookup(&self, query: &str, question: &str) -> String {
        if let Some(entry) = self.direct_match(query) {
            return entry.summary.clone();
        }

        let Some(model) = &self.model else {
            return NOT_FOUND.to_string();
        };
        if self.entries.is_empty() {
            return EMPTY_KNOWLEDGE_BASE.to_string();
        }

        let question = if question.trim().is_empty() {
            query
        } else {
            question
        };
        match self.model_match(model, question).await {
            Some(entry) => entry.summary.clone(),
            None => NOT_FOUND.to_string(),
        }
    }
}

#[async_trait]
impl<B: Backend + 'static> Tool for KnowledgeBase<B> {
    fn schema(&self) -> &ToolSchema {
        &KB
    }

    async fn execute(&self, args: &ToolArgs, question: &str) -> Result<Value, ToolError> {
        let query = args.str("q")?;
        Ok(Value::String(self.lookup(query, question).await))
    }
}
