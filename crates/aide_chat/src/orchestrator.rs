//! The orchestrator: routes each turn, asks the active role for a reply and
//! keeps the requirement ledger current.

use std::sync::Arc;

use tracing::{debug, info, warn};

use aide_core::{
    readiness, substance, AgentRole, GenerationReadiness, Project, RequirementRecord,
    SubstanceConfig,
};
use aide_store::ProjectStore;

use crate::error::ChatResult;
use crate::llm::{CompletionClient, CompletionOptions};
use crate::prompts;
use crate::router;
use crate::specs;

/// Reply produced for one user turn.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub message: String,
    pub agent: AgentRole,
}

/// Coordinates router, prompts, completion service and the ledger.
pub struct Orchestrator {
    store: ProjectStore,
    completion: Arc<dyn CompletionClient>,
    substance_config: SubstanceConfig,
}

impl Orchestrator {
    pub fn new(store: ProjectStore, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            store,
            completion,
            substance_config: SubstanceConfig::default(),
        }
    }

    pub fn with_substance_config(mut self, config: SubstanceConfig) -> Self {
        self.substance_config = config;
        self
    }

    /// Welcome message for a freshly created project. The conversation
    /// always opens on the first chain role.
    pub fn start_conversation(&self, project_id: &str) -> ChatResult<String> {
        self.store
            .set_active_agent(project_id, AgentRole::first())?;
        Ok(prompts::welcome_message())
    }

    /// Handle one user turn: pick the answering role, get its reply and
    /// record the requirement outcome. Completion failures are recovered
    /// with an apology reply; only storage errors propagate.
    pub async fn route_message(
        &self,
        project_id: &str,
        user_message: &str,
    ) -> ChatResult<AgentReply> {
        let mut project = self.store.get(project_id)?;
        let current = project.active_agent;

        let next = router::next_agent(&project, user_message);
        if next != current {
            info!("Switched agent: {} -> {}", current, next);
            self.store.set_active_agent(project_id, next)?;
            project.active_agent = next;
        }

        let response = self.agent_response(&project, next, user_message).await;

        let record = self.build_record(next, &response, user_message);
        debug!(
            "Requirements updated for {} (substance: {})",
            next, record.has_substance
        );
        self.store.update_requirement(project_id, next, record)?;

        Ok(AgentReply {
            message: response,
            agent: next,
        })
    }

    /// Current readiness of the project's requirement ledger.
    pub fn readiness(&self, project_id: &str) -> ChatResult<GenerationReadiness> {
        let project = self.store.get(project_id)?;
        Ok(readiness::assess(&project))
    }

    async fn agent_response(
        &self,
        project: &Project,
        role: AgentRole,
        user_message: &str,
    ) -> String {
        let context = prompts::build_context(project, role);
        let prompt = prompts::role_prompt(role, user_message, &context);

        let raw = match self
            .completion
            .complete(&prompt, &CompletionOptions::chat())
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Completion failed for {}: {}", role, e);
                return format!(
                    "I encountered a technical issue. Please try again or rephrase \
                     your request. Error: {}",
                    e
                );
            }
        };

        // The UI designer is prompted not to emit code, but the model is not
        // always obedient; keep its replies descriptive.
        if role == AgentRole::UiDesigner {
            let cleaned = specs::filter_code_from_reply(&raw);
            if specs::contains_code_patterns(&cleaned) {
                warn!("UI designer reply still contained code, substituting safe response");
                return "I understand you're looking for design guidance. As a UI Designer, \
                        I focus on visual design concepts like color schemes, typography, and \
                        layout. Could you tell me about your preferred design style or any \
                        specific visual requirements you have in mind?"
                    .to_string();
            }
            return cleaned;
        }

        raw
    }

    fn build_record(
        &self,
        role: AgentRole,
        response: &str,
        user_message: &str,
    ) -> RequirementRecord {
        RequirementRecord {
            response: response.to_string(),
            user_message: user_message.to_string(),
            summary: specs::summarize_response(response),
            technical_specs: specs::extract_technical_specs(role, response),
            has_substance: substance::is_substantial(role, response, &self.substance_config),
            recorded_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Stub completion service replaying queued replies.
    struct StubCompletion {
        replies: Mutex<Vec<ChatResult<String>>>,
    }

    impl StubCompletion {
        fn new(replies: Vec<ChatResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for StubCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> ChatResult<String> {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Ok("Understood, noted for the requirements.".to_string());
            }
            replies.remove(0)
        }
    }

    fn setup(replies: Vec<ChatResult<String>>) -> (tempfile::TempDir, ProjectStore, Orchestrator) {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        let orchestrator = Orchestrator::new(store.clone(), StubCompletion::new(replies));
        (temp, store, orchestrator)
    }

    #[tokio::test]
    async fn a_turn_records_requirements_for_the_answering_role() {
        let (_temp, store, orchestrator) = setup(vec![Ok(
            "The app tracks daily tasks with due dates and completion state.".to_string(),
        )]);
        let project = store.create("Todo App").unwrap();

        let reply = orchestrator
            .route_message(&project.id, "a simple task tracker please")
            .await
            .unwrap();

        assert_eq!(reply.agent, AgentRole::RequirementsEvolver);
        let loaded = store.get(&project.id).unwrap();
        let record = &loaded.requirements[&AgentRole::RequirementsEvolver];
        assert!(record.has_substance);
        assert_eq!(record.user_message, "a simple task tracker please");
    }

    #[tokio::test]
    async fn completion_failure_yields_apology_not_error() {
        let (_temp, store, orchestrator) = setup(vec![Err(ChatError::Completion(
            "connection refused".to_string(),
        ))]);
        let project = store.create("p").unwrap();

        let reply = orchestrator
            .route_message(&project.id, "hello there, can we get going now")
            .await
            .unwrap();

        assert!(reply.message.contains("technical issue"));
        assert!(reply.message.contains("connection refused"));
        // The apology is recorded but classified, not hand-set.
        let loaded = store.get(&project.id).unwrap();
        assert!(loaded.requirements.contains_key(&reply.agent));
    }

    #[tokio::test]
    async fn keyword_turn_switches_the_stored_active_agent() {
        let (_temp, store, orchestrator) = setup(vec![Ok(
            "A relational database with a tasks table and a users table.".to_string(),
        )]);
        let project = store.create("p").unwrap();

        let reply = orchestrator
            .route_message(&project.id, "where should we persist things?")
            .await
            .unwrap();

        assert_eq!(reply.agent, AgentRole::DataArchitect);
        let loaded = store.get(&project.id).unwrap();
        assert_eq!(loaded.active_agent, AgentRole::DataArchitect);
    }

    #[tokio::test]
    async fn ui_designer_code_reply_is_replaced_with_safe_guidance() {
        let (_temp, store, orchestrator) = setup(vec![Ok(
            "Use render_template('index.html') and wire up the click handler();".to_string(),
        )]);
        let project = store.create("p").unwrap();
        store
            .set_active_agent(&project.id, AgentRole::UiDesigner)
            .unwrap();

        let reply = orchestrator
            .route_message(&project.id, "hmm, not sure yet")
            .await
            .unwrap();

        assert_eq!(reply.agent, AgentRole::UiDesigner);
        assert!(reply.message.contains("design guidance"));
        assert!(!reply.message.contains("render_template"));
    }

    #[tokio::test]
    async fn missing_project_propagates_store_error() {
        let (_temp, _store, orchestrator) = setup(vec![]);
        let result = orchestrator.route_message("missing1", "hello").await;
        assert!(matches!(
            result,
            Err(ChatError::Store(aide_store::StoreError::ProjectNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn readiness_reflects_recorded_substance() {
        let (_temp, store, orchestrator) = setup(vec![
            Ok("The app tracks tasks with due dates, labels and completion state.".to_string()),
            Ok("Persist everything in a small relational database schema.".to_string()),
        ]);
        let project = store.create("p").unwrap();

        assert!(!orchestrator.readiness(&project.id).unwrap().can_generate);

        orchestrator
            .route_message(&project.id, "a simple task tracker please")
            .await
            .unwrap();
        orchestrator
            .route_message(&project.id, "where should we persist things?")
            .await
            .unwrap();

        let readiness = orchestrator.readiness(&project.id).unwrap();
        assert!(readiness.can_generate);
        assert_eq!(readiness.substantial_agents, 2);
    }
}
