//! The project builder: one generation run from plan to preview copy.

use std::sync::Arc;

use tracing::info;

use aide_chat::CompletionClient;
use aide_store::ProjectStore;

use crate::error::BuildResult;
use crate::generator::{self, GenerationRun};
use crate::planner;
use crate::preview::{PreviewConfig, PreviewManager};

/// Drives generation runs and owns the preview manager.
pub struct ProjectBuilder {
    store: ProjectStore,
    completion: Arc<dyn CompletionClient>,
    preview: PreviewManager,
}

impl ProjectBuilder {
    pub fn new(store: ProjectStore, completion: Arc<dyn CompletionClient>) -> Self {
        Self::with_preview_config(store, completion, PreviewConfig::default())
    }

    pub fn with_preview_config(
        store: ProjectStore,
        completion: Arc<dyn CompletionClient>,
        config: PreviewConfig,
    ) -> Self {
        Self {
            store,
            completion,
            preview: PreviewManager::new(config),
        }
    }

    /// Run the full generation pipeline for a project: clean the previous
    /// output, plan the structure, generate every file, record the results
    /// and materialize a fresh preview copy.
    ///
    /// Per-file completion failures are absorbed by the generator; only
    /// storage and directory-cleanup failures abort the run.
    pub async fn generate_project(&self, project_id: &str) -> BuildResult<GenerationRun> {
        let project = self.store.get(project_id)?;
        info!("Starting project generation for {}", project_id);

        let src_dir = self.store.src_dir(project_id);
        self.preview.clean_directory(&src_dir).await?;
        std::fs::create_dir_all(&src_dir)?;

        let plan = planner::plan_structure(&project, &*self.completion).await;
        info!("Planned {} files: {:?}", plan.len(), plan);

        let run =
            generator::generate_files(&project, &plan, &*self.completion, &src_dir).await;

        self.store.replace_generated_files(project_id, &run.files)?;

        self.preview
            .materialize(&src_dir, &self.store.preview_dir(project_id))
            .await?;

        Ok(run)
    }

    /// Preview URL for a project, starting the preview process on first
    /// request and reusing the binding afterwards.
    pub async fn preview_url(&self, project_id: &str) -> BuildResult<String> {
        // Validate the id before touching the port table.
        self.store.get(project_id)?;
        self.preview
            .preview_url(project_id, &self.store.preview_dir(project_id))
            .await
    }
}
