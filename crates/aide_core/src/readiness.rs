//! Generation readiness: the single gate in front of code generation.

use serde::{Deserialize, Serialize};

use crate::roles::AgentRole;
use crate::types::Project;

/// Result of a readiness check, suitable for sending to the client as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReadiness {
    pub can_generate: bool,
    /// How many roles have substantive contributions.
    pub substantial_agents: usize,
    /// The contributing roles, in chain order.
    pub contributing_agents: Vec<AgentRole>,
    /// Human-readable status for UI feedback.
    pub message: String,
}

/// Evaluate whether the project has gathered enough substance to generate.
///
/// Enough means: two substantial roles, or the requirements role plus any
/// other, or any three roles regardless of identity.
pub fn assess(project: &Project) -> GenerationReadiness {
    let contributing: Vec<AgentRole> = crate::roles::AGENT_CHAIN
        .iter()
        .copied()
        .filter(|role| project.has_substance_from(*role))
        .collect();
    let substantial = contributing.len();

    let has_requirements = project.has_substance_from(AgentRole::RequirementsEvolver);
    let other_roles = substantial - usize::from(has_requirements);
    let can_generate =
        substantial >= 2 || (has_requirements && other_roles >= 1) || substantial >= 3;

    GenerationReadiness {
        can_generate,
        substantial_agents: substantial,
        contributing_agents: contributing,
        message: status_message(can_generate, substantial),
    }
}

fn status_message(can_generate: bool, substantial: usize) -> String {
    if can_generate {
        format!(
            "Ready to generate! Collected requirements from {} agents.",
            substantial
        )
    } else if substantial == 0 {
        "Please describe your project requirements first.".to_string()
    } else if substantial == 1 {
        "Getting there! A bit more detail about design or functionality would help.".to_string()
    } else {
        "Making progress! A few more details about your preferences would be great.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequirementRecord;
    use chrono::Utc;
    use std::collections::HashMap;

    fn record(has_substance: bool) -> RequirementRecord {
        RequirementRecord {
            response: "r".to_string(),
            user_message: "u".to_string(),
            summary: "s".to_string(),
            technical_specs: HashMap::new(),
            has_substance,
            recorded_at: Utc::now(),
        }
    }

    fn project_with(roles: &[AgentRole]) -> Project {
        let mut project = Project::new("gate");
        for role in roles {
            project.requirements.insert(*role, record(true));
        }
        project
    }

    #[test]
    fn empty_ledger_cannot_generate() {
        let readiness = assess(&Project::new("empty"));
        assert!(!readiness.can_generate);
        assert_eq!(readiness.substantial_agents, 0);
        assert!(readiness.message.contains("describe your project"));
    }

    #[test]
    fn requirements_role_alone_is_not_enough() {
        let readiness = assess(&project_with(&[AgentRole::RequirementsEvolver]));
        assert!(!readiness.can_generate);
        assert_eq!(readiness.substantial_agents, 1);
    }

    #[test]
    fn requirements_plus_one_other_generates() {
        let readiness = assess(&project_with(&[
            AgentRole::RequirementsEvolver,
            AgentRole::UiDesigner,
        ]));
        assert!(readiness.can_generate);
        assert!(readiness.message.starts_with("Ready to generate"));
    }

    #[test]
    fn any_two_roles_generate() {
        let readiness = assess(&project_with(&[
            AgentRole::DataArchitect,
            AgentRole::DevOps,
        ]));
        assert!(readiness.can_generate);
    }

    #[test]
    fn any_three_roles_generate() {
        let readiness = assess(&project_with(&[
            AgentRole::UxArchitect,
            AgentRole::FrontendEngineer,
            AgentRole::ApiDesigner,
        ]));
        assert!(readiness.can_generate);
        assert_eq!(readiness.substantial_agents, 3);
    }

    #[test]
    fn non_substantial_records_do_not_count() {
        let mut project = Project::new("gate");
        project
            .requirements
            .insert(AgentRole::RequirementsEvolver, record(false));
        project
            .requirements
            .insert(AgentRole::UiDesigner, record(false));
        let readiness = assess(&project);
        assert!(!readiness.can_generate);
        assert_eq!(readiness.substantial_agents, 0);
    }

    #[test]
    fn contributing_agents_are_listed_in_chain_order() {
        let readiness = assess(&project_with(&[
            AgentRole::DevOps,
            AgentRole::RequirementsEvolver,
            AgentRole::DataArchitect,
        ]));
        assert_eq!(
            readiness.contributing_agents,
            vec![
                AgentRole::RequirementsEvolver,
                AgentRole::DataArchitect,
                AgentRole::DevOps
            ]
        );
    }
}
