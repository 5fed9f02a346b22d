//! Substance classification for agent replies.
//!
//! A reply "has substance" when it carries enough concrete information to
//! count toward generation readiness. Early chain roles are allowed short
//! declarative statements; technical roles must mention something from their
//! own vocabulary before their contribution is trusted.

use crate::roles::AgentRole;

/// Thresholds and vocabularies for the classifier. The defaults are the
/// hand-tuned production values; override fields per instance when needed.
#[derive(Debug, Clone)]
pub struct SubstanceConfig {
    /// Replies shorter than this are never substantial.
    pub min_reply_chars: usize,
    /// Minimum length for early-role replies.
    pub early_min_chars: usize,
    /// Early-role replies below this length that end in a question mark and
    /// open with a clarifying phrase are treated as pure questions.
    pub question_max_chars: usize,
    /// Minimum length for technical-role replies.
    pub technical_min_chars: usize,
    /// Phrases that mark a short reply as a clarifying question.
    pub question_openers: Vec<&'static str>,
}

impl Default for SubstanceConfig {
    fn default() -> Self {
        Self {
            min_reply_chars: 20,
            early_min_chars: 30,
            question_max_chars: 80,
            technical_min_chars: 40,
            question_openers: vec!["what would", "can you", "please provide"],
        }
    }
}

/// Vocabulary a technical role must touch for its reply to count.
fn technical_vocabulary(role: AgentRole) -> &'static [&'static str] {
    match role {
        AgentRole::FrontendEngineer => &["javascript", "framework", "component", "interaction"],
        AgentRole::DataArchitect => &["database", "storage", "data", "schema"],
        AgentRole::ApiDesigner => &["endpoint", "api", "rest", "backend"],
        AgentRole::DevOps => &["deployment", "hosting", "server", "cloud"],
        // Early roles carry no vocabulary requirement.
        _ => &[],
    }
}

/// Decide whether a reply from the given role is substantial.
///
/// Deterministic: the same (role, text) always yields the same answer.
pub fn is_substantial(role: AgentRole, response: &str, config: &SubstanceConfig) -> bool {
    let trimmed = response.trim();
    if trimmed.len() < config.min_reply_chars {
        return false;
    }

    let lower = trimmed.to_lowercase();

    if role.is_early_role() {
        let is_pure_question = trimmed.ends_with('?')
            && trimmed.len() < config.question_max_chars
            && config.question_openers.iter().any(|p| lower.contains(p));
        trimmed.len() >= config.early_min_chars && !is_pure_question
    } else {
        let has_technical_content = technical_vocabulary(role)
            .iter()
            .any(|word| lower.contains(word));
        trimmed.len() >= config.technical_min_chars && has_technical_content
    }
}
