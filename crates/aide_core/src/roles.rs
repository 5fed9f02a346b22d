//! Agent role definitions and the fixed requirement-gathering chain.

use serde::{Deserialize, Serialize};

/// Specialist roles in the requirement-gathering chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    RequirementsEvolver,
    UxArchitect,
    UiDesigner,
    FrontendEngineer,
    DataArchitect,
    ApiDesigner,
    DevOps,
}

/// The chain, in conversation order. Routing never leaves this sequence.
pub const AGENT_CHAIN: [AgentRole; 7] = [
    AgentRole::RequirementsEvolver,
    AgentRole::UxArchitect,
    AgentRole::UiDesigner,
    AgentRole::FrontendEngineer,
    AgentRole::DataArchitect,
    AgentRole::ApiDesigner,
    AgentRole::DevOps,
];

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::RequirementsEvolver => "requirements_evolver",
            AgentRole::UxArchitect => "ux_architect",
            AgentRole::UiDesigner => "ui_designer",
            AgentRole::FrontendEngineer => "frontend_engineer",
            AgentRole::DataArchitect => "data_architect",
            AgentRole::ApiDesigner => "api_designer",
            AgentRole::DevOps => "devops",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::RequirementsEvolver => "Requirements Evolver",
            AgentRole::UxArchitect => "UX Architect",
            AgentRole::UiDesigner => "UI Designer",
            AgentRole::FrontendEngineer => "Frontend Engineer",
            AgentRole::DataArchitect => "Data Architect",
            AgentRole::ApiDesigner => "API Designer",
            AgentRole::DevOps => "DevOps",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::RequirementsEvolver => "Understands goals and key features",
            AgentRole::UxArchitect => "Designs user experience and navigation",
            AgentRole::UiDesigner => "Defines visual design and styling",
            AgentRole::FrontendEngineer => "Plans technical frontend implementation",
            AgentRole::DataArchitect => "Designs data storage and schema",
            AgentRole::ApiDesigner => "Designs backend routes and API contracts",
            AgentRole::DevOps => "Plans deployment and hosting",
        }
    }

    /// Position of this role in the chain.
    pub fn chain_index(&self) -> usize {
        AGENT_CHAIN
            .iter()
            .position(|r| r == self)
            .expect("role is always a chain member")
    }

    /// The role that follows this one, or `None` for the last role.
    pub fn next_in_chain(&self) -> Option<AgentRole> {
        AGENT_CHAIN.get(self.chain_index() + 1).copied()
    }

    /// Whether this is one of the early, conversational roles. Early roles
    /// are trusted with short statements; later roles must show technical
    /// grounding before their contribution counts (see [`crate::substance`]).
    pub fn is_early_role(&self) -> bool {
        self.chain_index() < 3
    }

    /// First role in the chain; every new project starts here.
    pub fn first() -> AgentRole {
        AGENT_CHAIN[0]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_starts_with_requirements_and_ends_with_devops() {
        assert_eq!(AgentRole::first(), AgentRole::RequirementsEvolver);
        assert_eq!(AGENT_CHAIN[6], AgentRole::DevOps);
        assert_eq!(AgentRole::DevOps.next_in_chain(), None);
    }

    #[test]
    fn next_in_chain_walks_the_declared_order() {
        let mut role = AgentRole::first();
        let mut walked = vec![role];
        while let Some(next) = role.next_in_chain() {
            walked.push(next);
            role = next;
        }
        assert_eq!(walked.as_slice(), &AGENT_CHAIN);
    }

    #[test]
    fn early_roles_are_the_first_three() {
        let early: Vec<_> = AGENT_CHAIN.iter().filter(|r| r.is_early_role()).collect();
        assert_eq!(
            early,
            vec![
                &AgentRole::RequirementsEvolver,
                &AgentRole::UxArchitect,
                &AgentRole::UiDesigner
            ]
        );
    }

    #[test]
    fn wire_names_are_snake_case() {
        let json = serde_json::to_string(&AgentRole::UxArchitect).unwrap();
        assert_eq!(json, "\"ux_architect\"");
        let back: AgentRole = serde_json::from_str("\"requirements_evolver\"").unwrap();
        assert_eq!(back, AgentRole::RequirementsEvolver);
    }
}
