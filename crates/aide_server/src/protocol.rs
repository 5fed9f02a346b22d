//! Typed JSON protocol spoken over the per-client WebSocket channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aide_core::{AgentRole, GeneratedFile};

/// Inbound message kinds.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    NewProject {
        #[serde(default)]
        project_name: Option<String>,
    },
    UserMessage {
        #[serde(default)]
        project_id: Option<String>,
        #[serde(default)]
        message: String,
    },
    GetPreview {
        #[serde(default)]
        project_id: Option<String>,
    },
    CheckGenerationStatus {
        #[serde(default)]
        project_id: Option<String>,
    },
    GenerateCode {
        #[serde(default)]
        project_id: Option<String>,
    },
    Ping,
}

/// Names of the inbound kinds, for distinguishing an unknown kind from a
/// malformed payload of a known kind.
pub const KNOWN_REQUEST_KINDS: [&str; 6] = [
    "new_project",
    "user_message",
    "get_preview",
    "check_generation_status",
    "generate_code",
    "ping",
];

/// Outbound message kinds.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ProjectCreated {
        project_id: String,
        project_name: String,
    },
    AgentResponse {
        message: String,
        agent: AgentRole,
        timestamp: DateTime<Utc>,
    },
    GenerationStatus {
        project_id: String,
        can_generate: bool,
        substantial_agents: usize,
        agent_contributions: Vec<AgentRole>,
        message: String,
    },
    GenerationStarted {
        project_id: String,
        message: String,
    },
    CodeGenerated {
        project_id: String,
        files: Vec<GeneratedFile>,
        preview_url: String,
        file_count: usize,
        total_size: usize,
        status: String,
    },
    GenerationFailed {
        project_id: String,
        error: String,
        message: String,
        status: String,
    },
    CodeGenerationError {
        project_id: String,
        error: String,
        status: String,
    },
    PreviewUrl {
        preview_url: String,
    },
    Error {
        message: String,
    },
    Pong {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn agent_response(message: impl Into<String>, agent: AgentRole) -> Self {
        Self::AgentResponse {
            message: message.into(),
            agent,
            timestamp: Utc::now(),
        }
    }
}
