//! WebSocket session handling.
//!
//! Each client gets one socket; its requests are processed strictly in
//! arrival order. Replies flow through an in-process channel so handlers
//! can push progress frames (generation_started, status updates) before a
//! long operation finishes.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use aide_builder::ProjectBuilder;
use aide_chat::Orchestrator;
use aide_core::ConversationMessage;
use aide_store::ProjectStore;

use crate::protocol::{ClientRequest, ServerMessage, KNOWN_REQUEST_KINDS};

/// Shared server state handed to every connection.
pub struct AppState {
    pub store: ProjectStore,
    pub orchestrator: Orchestrator,
    pub builder: ProjectBuilder,
}

type Replies = mpsc::UnboundedSender<ServerMessage>;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    info!("Client connected");

    // Forward handler replies to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(reply) = rx.recv().await {
            match serde_json::to_string(&reply) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Failed to serialize reply: {}", e),
            }
        }
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                dispatch(&state, &text, &tx).await;
            }
            Ok(Message::Close(_)) => {
                info!("Client disconnected");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
    info!("Connection closed");
}

/// Parse one inbound frame and run the matching handler. Transport-level
/// problems become `error` replies; the session always continues.
pub async fn dispatch(state: &AppState, text: &str, replies: &Replies) {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            send(replies, ServerMessage::error("Invalid JSON format"));
            return;
        }
    };

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("message")
        .to_string();

    let request: ClientRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            if KNOWN_REQUEST_KINDS.contains(&kind.as_str()) {
                send(
                    replies,
                    ServerMessage::error(format!("Invalid {} payload: {}", kind, e)),
                );
            } else {
                send(
                    replies,
                    ServerMessage::error(format!("Unknown message type: {}", kind)),
                );
            }
            return;
        }
    };

    match request {
        ClientRequest::NewProject { project_name } => {
            handle_new_project(state, project_name, replies).await;
        }
        ClientRequest::UserMessage {
            project_id,
            message,
        } => {
            handle_user_message(state, project_id, message, replies).await;
        }
        ClientRequest::CheckGenerationStatus { project_id } => {
            handle_generation_status(state, project_id, replies);
        }
        ClientRequest::GenerateCode { project_id } => {
            handle_generate_code(state, project_id, replies).await;
        }
        ClientRequest::GetPreview { project_id } => {
            handle_get_preview(state, project_id, replies).await;
        }
        ClientRequest::Ping => {
            send(
                replies,
                ServerMessage::Pong {
                    message: "pong".to_string(),
                },
            );
        }
    }
}

fn send(replies: &Replies, message: ServerMessage) {
    let _ = replies.send(message);
}

/// Resolve the optional project id common to most requests.
fn require_project_id(project_id: Option<String>, replies: &Replies) -> Option<String> {
    match project_id {
        Some(id) if !id.is_empty() => Some(id),
        _ => {
            send(replies, ServerMessage::error("No project ID provided"));
            None
        }
    }
}

async fn handle_new_project(state: &AppState, name: Option<String>, replies: &Replies) {
    let name = name.unwrap_or_else(|| "New Project".to_string());

    let project = match state.store.create(name.as_str()) {
        Ok(project) => project,
        Err(e) => {
            warn!("New project error: {}", e);
            send(
                replies,
                ServerMessage::error(format!("Failed to create project: {}", e)),
            );
            return;
        }
    };

    send(
        replies,
        ServerMessage::ProjectCreated {
            project_id: project.id.clone(),
            project_name: name,
        },
    );

    match state.orchestrator.start_conversation(&project.id) {
        Ok(welcome) => {
            send(
                replies,
                ServerMessage::agent_response(welcome, project.active_agent),
            );
        }
        Err(e) => {
            warn!("New project error: {}", e);
            // Roll back the half-created project before reporting.
            if let Err(cleanup) = state.store.cleanup(&project.id) {
                warn!("Cleanup of failed project {} failed: {}", project.id, cleanup);
            }
            send(
                replies,
                ServerMessage::error(format!("Failed to create project: {}", e)),
            );
        }
    }
}

async fn handle_user_message(
    state: &AppState,
    project_id: Option<String>,
    message: String,
    replies: &Replies,
) {
    let Some(project_id) = require_project_id(project_id, replies) else {
        return;
    };

    // Store the user turn first, attributed to the currently active agent.
    let project = match state.store.get(&project_id) {
        Ok(project) => project,
        Err(e) => {
            send(
                replies,
                ServerMessage::error(format!("Failed to process message: {}", e)),
            );
            return;
        }
    };
    if let Err(e) = state.store.add_message(
        &project_id,
        ConversationMessage::user(&message, project.active_agent),
    ) {
        send(
            replies,
            ServerMessage::error(format!("Failed to process message: {}", e)),
        );
        return;
    }

    let reply = match state.orchestrator.route_message(&project_id, &message).await {
        Ok(reply) => reply,
        Err(e) => {
            send(
                replies,
                ServerMessage::error(format!("Failed to process message: {}", e)),
            );
            return;
        }
    };

    if let Err(e) = state.store.add_message(
        &project_id,
        ConversationMessage::agent(&reply.message, reply.agent),
    ) {
        send(
            replies,
            ServerMessage::error(format!("Failed to process message: {}", e)),
        );
        return;
    }

    send(
        replies,
        ServerMessage::agent_response(reply.message, reply.agent),
    );

    // Keep the client's generate button in sync after every turn.
    handle_generation_status(state, Some(project_id), replies);
}

fn handle_generation_status(
    state: &AppState,
    project_id: Option<String>,
    replies: &Replies,
) {
    let Some(project_id) = require_project_id(project_id, replies) else {
        return;
    };

    match state.orchestrator.readiness(&project_id) {
        Ok(readiness) => {
            send(
                replies,
                ServerMessage::GenerationStatus {
                    project_id,
                    can_generate: readiness.can_generate,
                    substantial_agents: readiness.substantial_agents,
                    agent_contributions: readiness.contributing_agents,
                    message: readiness.message,
                },
            );
        }
        Err(e) => {
            send(
                replies,
                ServerMessage::error(format!("Failed to check generation status: {}", e)),
            );
        }
    }
}

async fn handle_generate_code(
    state: &AppState,
    project_id: Option<String>,
    replies: &Replies,
) {
    let Some(project_id) = require_project_id(project_id, replies) else {
        return;
    };

    let readiness = match state.orchestrator.readiness(&project_id) {
        Ok(readiness) => readiness,
        Err(e) => {
            send(
                replies,
                ServerMessage::error(format!("Failed to generate code: {}", e)),
            );
            return;
        }
    };

    if !readiness.can_generate {
        warn!(
            "Code generation blocked for {}: {}",
            project_id, readiness.message
        );
        send(
            replies,
            ServerMessage::GenerationFailed {
                project_id,
                error: "Insufficient requirements".to_string(),
                message: readiness.message,
                status: "failed".to_string(),
            },
        );
        return;
    }

    info!("Manual code generation triggered for project {}", project_id);
    send(
        replies,
        ServerMessage::GenerationStarted {
            project_id: project_id.clone(),
            message: "Starting code generation...".to_string(),
        },
    );

    let run = match state.builder.generate_project(&project_id).await {
        Ok(run) => run,
        Err(e) => {
            warn!("Code generation error for {}: {}", project_id, e);
            send(
                replies,
                ServerMessage::CodeGenerationError {
                    project_id: project_id.clone(),
                    error: e.to_string(),
                    status: "failed".to_string(),
                },
            );
            send(
                replies,
                ServerMessage::error(format!("Failed to generate code: {}", e)),
            );
            return;
        }
    };

    let preview_url = match state.builder.preview_url(&project_id).await {
        Ok(url) => url,
        Err(e) => {
            warn!("Preview unavailable for {}: {}", project_id, e);
            String::new()
        }
    };

    let total_size = run.files.iter().map(|f| f.size).sum();
    info!(
        "Code generated for project {}: {}/{} files",
        project_id, run.succeeded, run.planned
    );
    send(
        replies,
        ServerMessage::CodeGenerated {
            project_id,
            file_count: run.files.len(),
            total_size,
            files: run.files,
            preview_url,
            status: "success".to_string(),
        },
    );
}

async fn handle_get_preview(
    state: &AppState,
    project_id: Option<String>,
    replies: &Replies,
) {
    let Some(project_id) = require_project_id(project_id, replies) else {
        return;
    };

    match state.builder.preview_url(&project_id).await {
        Ok(preview_url) => {
            send(replies, ServerMessage::PreviewUrl { preview_url });
        }
        Err(e) => {
            send(
                replies,
                ServerMessage::error(format!("Failed to get preview: {}", e)),
            );
        }
    }
}
