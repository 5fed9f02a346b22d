//! Agent routing: the state machine over the chain.
//!
//! On every user turn the router either honors an explicit approval, jumps
//! to a role the message names by keyword, advances past a role that has
//! already contributed, or stays put. The keyword and approval tables are
//! fixed configuration, initialized once and never mutated.

use tracing::debug;

use aide_core::{AgentRole, Project, AGENT_CHAIN};

/// Phrases that signal explicit approval of the current role's output.
pub const APPROVAL_PHRASES: &[&str] = &[
    "approved",
    "perfect",
    "looks good",
    "proceed",
    "move forward",
    "next phase",
    "next agent",
    "switch to",
];

/// Where an approval sends the conversation, per source role. Roles absent
/// from this table fall through to the remaining transition rules.
const APPROVAL_OVERRIDES: &[(AgentRole, AgentRole)] = &[
    (AgentRole::RequirementsEvolver, AgentRole::UxArchitect),
    (AgentRole::UxArchitect, AgentRole::FrontendEngineer),
    (AgentRole::UiDesigner, AgentRole::FrontendEngineer),
];

/// Keywords that pull the conversation directly to a role.
///
/// Matching is plain substring containment on the lowercased message. Several
/// sets overlap ("server" appears for both the API and DevOps roles); the
/// winner is always the first matching role in chain declaration order.
pub fn jump_keywords(role: AgentRole) -> &'static [&'static str] {
    match role {
        // The requirements role is the entry point; nothing jumps back to it.
        AgentRole::RequirementsEvolver => &[],
        AgentRole::UxArchitect => &[
            "navigate",
            "user flow",
            "ux",
            "experience",
            "usability",
            "interface",
        ],
        AgentRole::UiDesigner => &["change design", "change color", "ui design", "ui"],
        AgentRole::FrontendEngineer => &[
            "javascript",
            "react",
            "vue",
            "frontend",
            "client",
            "browser",
            "technical",
            "implementation",
        ],
        AgentRole::DataArchitect => &["database", "data", "store", "save", "storage", "persist"],
        AgentRole::ApiDesigner => &["api", "backend", "server", "endpoint", "rest", "json"],
        AgentRole::DevOps => &["deploy", "host", "server", "domain", "production", "cloud"],
    }
}

/// Decide which role answers this turn.
///
/// Priority order: approval override, keyword jump (first match in chain
/// order, current role excluded), progress-based advance, stay.
pub fn next_agent(project: &Project, user_message: &str) -> AgentRole {
    let current = project.active_agent;
    let lower = user_message.to_lowercase();

    if APPROVAL_PHRASES.iter().any(|p| lower.contains(p)) {
        if let Some((_, target)) = APPROVAL_OVERRIDES.iter().find(|(from, _)| *from == current) {
            debug!("Approval detected: {} -> {}", current, target);
            return *target;
        }
    }

    for role in AGENT_CHAIN {
        if role == current {
            continue;
        }
        if jump_keywords(role).iter().any(|k| lower.contains(k)) {
            debug!("Keyword match: switching to {}", role);
            return role;
        }
    }

    let contributed = project.has_substance_from(current);
    let turns = project.turns_for(current);
    if contributed || turns >= 2 {
        if let Some(next) = current.next_in_chain() {
            debug!(
                "Progress-based switch: {} -> {} (contributed: {}, turns: {})",
                current, next, contributed, turns
            );
            return next;
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use aide_core::{ConversationMessage, RequirementRecord};
    use chrono::Utc;
    use std::collections::HashMap;

    fn project_at(role: AgentRole) -> Project {
        let mut project = Project::new("router");
        project.active_agent = role;
        project
    }

    fn substantial_record() -> RequirementRecord {
        RequirementRecord {
            response: "r".to_string(),
            user_message: "u".to_string(),
            summary: "s".to_string(),
            technical_specs: HashMap::new(),
            has_substance: true,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn approval_overrides_specific_source_states() {
        let project = project_at(AgentRole::UiDesigner);
        assert_eq!(
            next_agent(&project, "Looks good, let's continue"),
            AgentRole::FrontendEngineer
        );

        let project = project_at(AgentRole::RequirementsEvolver);
        assert_eq!(next_agent(&project, "approved"), AgentRole::UxArchitect);
    }

    #[test]
    fn approval_without_override_falls_through_to_keywords() {
        // DevOps has no approval override; the message also names the
        // database domain, so the keyword rule decides.
        let project = project_at(AgentRole::DevOps);
        assert_eq!(
            next_agent(&project, "Perfect, but what about the database?"),
            AgentRole::DataArchitect
        );
    }

    #[test]
    fn keyword_jumps_regardless_of_current_role() {
        let project = project_at(AgentRole::RequirementsEvolver);
        assert_eq!(
            next_agent(&project, "How should we deploy this to production?"),
            AgentRole::DevOps
        );

        let project = project_at(AgentRole::DevOps);
        assert_eq!(
            next_agent(&project, "I want to change color of the header"),
            AgentRole::UiDesigner
        );
    }

    #[test]
    fn overlapping_keywords_resolve_to_first_chain_match() {
        // "server" belongs to both the API designer and DevOps keyword sets;
        // the API designer comes first in the chain and must win.
        let project = project_at(AgentRole::RequirementsEvolver);
        assert_eq!(
            next_agent(&project, "It needs its own server"),
            AgentRole::ApiDesigner
        );

        // From the API designer itself the current role is skipped, so the
        // same message now lands on DevOps.
        let project = project_at(AgentRole::ApiDesigner);
        assert_eq!(
            next_agent(&project, "It needs its own server"),
            AgentRole::DevOps
        );
    }

    #[test]
    fn progress_advances_after_substantial_contribution() {
        let mut project = project_at(AgentRole::UxArchitect);
        project
            .requirements
            .insert(AgentRole::UxArchitect, substantial_record());
        assert_eq!(next_agent(&project, "sounds fine"), AgentRole::UiDesigner);
    }

    #[test]
    fn progress_advances_after_two_turns_without_substance() {
        let mut project = project_at(AgentRole::UiDesigner);
        project
            .messages
            .push(ConversationMessage::user("hm", AgentRole::UiDesigner));
        project
            .messages
            .push(ConversationMessage::agent("any preference?", AgentRole::UiDesigner));
        assert_eq!(next_agent(&project, "not sure yet"), AgentRole::FrontendEngineer);
    }

    #[test]
    fn last_role_never_advances_past_the_chain() {
        let mut project = project_at(AgentRole::DevOps);
        project
            .requirements
            .insert(AgentRole::DevOps, substantial_record());
        assert_eq!(next_agent(&project, "sounds fine"), AgentRole::DevOps);
    }

    #[test]
    fn no_signal_stays_on_current_role() {
        let project = project_at(AgentRole::UxArchitect);
        assert_eq!(next_agent(&project, "hmm let me think"), AgentRole::UxArchitect);
    }

    #[test]
    fn router_output_is_always_a_chain_member() {
        let messages = [
            "approved",
            "what about the database and the api and deployment?",
            "ui please",
            "nothing in particular",
        ];
        for role in AGENT_CHAIN {
            for message in messages {
                let project = project_at(role);
                let next = next_agent(&project, message);
                assert!(AGENT_CHAIN.contains(&next));
            }
        }
    }
}
