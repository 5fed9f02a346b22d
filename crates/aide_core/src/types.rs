//! The project document and its parts.
//!
//! A project is stored and mutated as one JSON document: conversation
//! messages, the per-role requirement ledger and the records of the last
//! generation run all live inside it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::AgentRole;

/// Opaque short project identifier, unique per data directory.
pub type ProjectId = String;

/// Generate a new short project id (URL-friendly prefix of a v4 UUID).
pub fn new_project_id() -> ProjectId {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// A single conversation turn, attributed to the agent that was active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// The chain role this turn is attributed to.
    pub agent: AgentRole,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>, agent: AgentRole) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            agent,
        }
    }

    pub fn agent(content: impl Into<String>, agent: AgentRole) -> Self {
        Self {
            role: MessageRole::Agent,
            content: content.into(),
            timestamp: Utc::now(),
            agent,
        }
    }
}

/// The latest contribution of one role. Overwritten each time the role
/// answers again; only the newest contribution per role is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementRecord {
    /// Full agent reply.
    pub response: String,
    /// The user message that prompted it.
    pub user_message: String,
    /// Short derived summary of the reply.
    pub summary: String,
    /// Key/value technical specs extracted from the reply.
    #[serde(default)]
    pub technical_specs: HashMap<String, serde_json::Value>,
    /// Recomputed by the substance classifier on every write, never hand-set.
    pub has_substance: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Lifecycle status of a project document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

/// One project: the unit of storage, conversation and generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ProjectStatus,
    /// Current position in the agent chain.
    pub active_agent: AgentRole,
    pub messages: Vec<ConversationMessage>,
    /// Requirement ledger, keyed by the role that answered.
    #[serde(default)]
    pub requirements: HashMap<AgentRole, RequirementRecord>,
    /// Records of the last generation run. A new run replaces the whole set.
    #[serde(default)]
    pub generated_files: Vec<GeneratedFile>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_project_id(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            status: ProjectStatus::Active,
            active_agent: AgentRole::first(),
            messages: Vec::new(),
            requirements: HashMap::new(),
            generated_files: Vec::new(),
        }
    }

    /// Number of conversation turns attributed to the given role.
    pub fn turns_for(&self, role: AgentRole) -> usize {
        self.messages.iter().filter(|m| m.agent == role).count()
    }

    /// Whether the given role has a substantive contribution on record.
    pub fn has_substance_from(&self, role: AgentRole) -> bool {
        self.requirements
            .get(&role)
            .map(|r| r.has_substance)
            .unwrap_or(false)
    }
}

/// One generated file as produced by a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative path inside the generated project.
    pub path: String,
    pub content: String,
    /// Content size in bytes.
    pub size: usize,
    /// Display classification derived from the extension.
    #[serde(rename = "type")]
    pub file_type: String,
    pub icon: String,
    pub language: String,
}

impl GeneratedFile {
    /// Build a record from a path and its content, deriving the display
    /// classification from the file extension.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let ext = extension_of(&path);
        Self {
            size: content.len(),
            file_type: file_type_for(ext),
            icon: icon_for(ext),
            language: language_for(ext),
            path,
            content,
        }
    }
}

fn extension_of(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or("")
}

fn file_type_for(ext: &str) -> String {
    match ext {
        "py" => "python",
        "html" => "html",
        "css" => "stylesheet",
        "js" => "javascript",
        "json" => "json",
        "md" => "markdown",
        _ => "text",
    }
    .to_string()
}

fn icon_for(ext: &str) -> String {
    match ext {
        "py" => "\u{1F40D}",
        "html" => "\u{1F310}",
        "css" => "\u{1F3A8}",
        "js" => "\u{1F4DC}",
        "json" => "\u{1F4CB}",
        "md" => "\u{1F4DD}",
        _ => "\u{1F4C4}",
    }
    .to_string()
}

fn language_for(ext: &str) -> String {
    match ext {
        "py" => "python",
        "html" => "html",
        "css" => "css",
        "js" => "javascript",
        "json" => "json",
        "md" => "markdown",
        _ => "text",
    }
    .to_string()
}
