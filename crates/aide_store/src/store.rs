//! Filesystem-backed project store.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use aide_core::{AgentRole, ConversationMessage, GeneratedFile, Project, RequirementRecord};

use crate::error::{StoreError, StoreResult};

/// Generated-file content is truncated to this length inside the stored
/// document; full content travels on the wire only.
const STORED_CONTENT_PREVIEW: usize = 500;

/// Lightweight row for project listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Persistence manager for project documents.
#[derive(Clone)]
pub struct ProjectStore {
    data_dir: PathBuf,
}

impl ProjectStore {
    /// Create a store rooted at the given data directory, creating it if
    /// missing.
    pub fn new(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn project_file(&self, project_id: &str) -> PathBuf {
        self.data_dir.join(format!("project-{}.json", project_id))
    }

    /// Directory holding the project's generated trees.
    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.data_dir.join(format!("project-{}", project_id))
    }

    /// Where a generation run writes its output.
    pub fn src_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("src")
    }

    /// Where the runnable preview copy lives.
    pub fn preview_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("preview")
    }

    /// Create a new project and persist its document and directory skeleton.
    pub fn create(&self, name: impl Into<String>) -> StoreResult<Project> {
        let project = Project::new(name);

        self.write(&project)?;

        let project_dir = self.project_dir(&project.id);
        fs::create_dir_all(project_dir.join("src"))?;
        fs::create_dir_all(project_dir.join("preview"))?;

        info!("Created project '{}' ({})", project.name, project.id);
        Ok(project)
    }

    /// Load the full project document. A missing project is an immediate
    /// error: it indicates a caller-side id mistake, not a transient state.
    pub fn get(&self, project_id: &str) -> StoreResult<Project> {
        let path = self.project_file(project_id);
        if !path.exists() {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the full document back, bumping `updated_at`.
    pub fn put(&self, project: &Project) -> StoreResult<()> {
        let mut project = project.clone();
        project.updated_at = Utc::now();
        self.write(&project)
    }

    fn write(&self, project: &Project) -> StoreResult<()> {
        let path = self.project_file(&project.id);
        let content = serde_json::to_string_pretty(project)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Append a conversation message.
    pub fn add_message(&self, project_id: &str, message: ConversationMessage) -> StoreResult<()> {
        let mut project = self.get(project_id)?;
        project.messages.push(message);
        self.put(&project)
    }

    /// Store the latest requirement record for a role, replacing any earlier
    /// contribution from the same role.
    pub fn update_requirement(
        &self,
        project_id: &str,
        role: AgentRole,
        record: RequirementRecord,
    ) -> StoreResult<()> {
        let mut project = self.get(project_id)?;
        debug!(
            "Recording requirements from {} (substance: {})",
            role, record.has_substance
        );
        project.requirements.insert(role, record);
        self.put(&project)
    }

    /// Move the conversation to another chain role.
    pub fn set_active_agent(&self, project_id: &str, role: AgentRole) -> StoreResult<()> {
        let mut project = self.get(project_id)?;
        project.active_agent = role;
        self.put(&project)
    }

    /// Replace the document's generated-file records with the output of a
    /// new run. Content is truncated to a preview; the `src/` tree holds the
    /// full files.
    pub fn replace_generated_files(
        &self,
        project_id: &str,
        files: &[GeneratedFile],
    ) -> StoreResult<()> {
        let mut project = self.get(project_id)?;
        project.generated_files = files
            .iter()
            .map(|f| {
                let mut stored = f.clone();
                if stored.content.chars().count() > STORED_CONTENT_PREVIEW {
                    let preview: String =
                        stored.content.chars().take(STORED_CONTENT_PREVIEW).collect();
                    stored.content = format!("{}...", preview);
                }
                stored
            })
            .collect();
        self.put(&project)
    }

    /// List all projects, newest first. Corrupt documents are skipped with a
    /// warning rather than failing the listing.
    pub fn list(&self) -> StoreResult<Vec<ProjectSummary>> {
        let mut summaries = Vec::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with("project-") || !name.ends_with(".json") {
                continue;
            }
            match fs::read_to_string(entry.path())
                .map_err(StoreError::from)
                .and_then(|c| serde_json::from_str::<Project>(&c).map_err(StoreError::from))
            {
                Ok(project) => summaries.push(ProjectSummary {
                    id: project.id,
                    name: project.name,
                    created_at: project.created_at,
                    message_count: project.messages.len(),
                }),
                Err(e) => warn!("Skipping corrupt project file {}: {}", name, e),
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    /// Remove a project that failed to create properly: document and
    /// directory tree both go.
    pub fn cleanup(&self, project_id: &str) -> StoreResult<()> {
        let file = self.project_file(project_id);
        if file.exists() {
            fs::remove_file(file)?;
        }
        let dir = self.project_dir(project_id);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        info!("Cleaned up project {}", project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_get_round_trips() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();

        let project = store.create("Todo App").unwrap();
        let loaded = store.get(&project.id).unwrap();

        assert_eq!(loaded.name, "Todo App");
        assert_eq!(loaded.active_agent, AgentRole::RequirementsEvolver);
        assert!(store.src_dir(&project.id).exists());
        assert!(store.preview_dir(&project.id).exists());
    }

    #[test]
    fn missing_project_is_an_error() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();

        match store.get("nope1234") {
            Err(StoreError::ProjectNotFound(id)) => assert_eq!(id, "nope1234"),
            other => panic!("expected ProjectNotFound, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn mutations_read_modify_write_the_whole_document() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        let project = store.create("p").unwrap();

        store
            .add_message(
                &project.id,
                ConversationMessage::user("build me a todo app", AgentRole::RequirementsEvolver),
            )
            .unwrap();
        store
            .set_active_agent(&project.id, AgentRole::UxArchitect)
            .unwrap();

        let loaded = store.get(&project.id).unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.active_agent, AgentRole::UxArchitect);
        assert!(loaded.updated_at >= loaded.created_at);
    }

    #[test]
    fn generated_files_are_replaced_not_appended() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        let project = store.create("p").unwrap();

        let first = vec![GeneratedFile::new("app.py", "from flask import Flask")];
        store.replace_generated_files(&project.id, &first).unwrap();

        let second = vec![
            GeneratedFile::new("app.py", "from flask import Flask, render_template"),
            GeneratedFile::new("requirements.txt", "flask==3.0.0"),
        ];
        store.replace_generated_files(&project.id, &second).unwrap();

        let loaded = store.get(&project.id).unwrap();
        assert_eq!(loaded.generated_files.len(), 2);
    }

    #[test]
    fn stored_file_content_is_truncated_to_a_preview() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        let project = store.create("p").unwrap();

        let long = "x".repeat(2000);
        store
            .replace_generated_files(&project.id, &[GeneratedFile::new("static/js/app.js", long)])
            .unwrap();

        let loaded = store.get(&project.id).unwrap();
        let stored = &loaded.generated_files[0];
        assert!(stored.content.len() <= STORED_CONTENT_PREVIEW + 3);
        assert!(stored.content.ends_with("..."));
        // The recorded size still reflects the full content.
        assert_eq!(stored.size, 2000);
    }

    #[test]
    fn listing_skips_corrupt_documents() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        store.create("good").unwrap();
        fs::write(temp.path().join("project-bad.json"), "{ not json").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "good");
    }

    #[test]
    fn cleanup_removes_document_and_tree() {
        let temp = tempdir().unwrap();
        let store = ProjectStore::new(temp.path()).unwrap();
        let project = store.create("doomed").unwrap();

        store.cleanup(&project.id).unwrap();

        assert!(store.get(&project.id).is_err());
        assert!(!store.project_dir(&project.id).exists());
    }
}
