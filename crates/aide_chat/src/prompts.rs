//! Prompt assembly for the specialist roles.
//!
//! Each role gets the same scaffold: shared conversational context, the
//! user's message, then the role's own focus and guidelines. Design-side
//! roles additionally carry strict no-code rules so their replies stay
//! descriptive.

use aide_core::{AgentRole, MessageRole, Project};

use crate::specs::brief_summary;

/// How many recent conversation messages the context carries.
const RECENT_MESSAGES: usize = 3;
/// Each carried message is truncated to this many characters.
const RECENT_MESSAGE_CHARS: usize = 150;

/// Welcome message sent when a project is created.
pub fn welcome_message() -> String {
    "Welcome to AIDE! I'm your AI Development Ensemble.\n\n\
     I'll help you build a complete web application by gathering requirements \
     across different domains:\n\n\
     - **Requirements Evolution** - Understanding your goals\n\
     - **UX Architecture** - User experience and navigation\n\
     - **UI Design** - Visual design and styling\n\
     - **Frontend Engineering** - Technical implementation\n\
     - **Data Architecture** - Database and storage\n\
     - **API Design** - Backend functionality\n\
     - **DevOps** - Deployment and hosting\n\n\
     Let's start with the basics: What kind of application would you like to build?"
        .to_string()
}

/// Shared context block: project overview, other roles' substantial
/// contributions, and the tail of the conversation.
pub fn build_context(project: &Project, role: AgentRole) -> String {
    let mut context = String::new();

    context.push_str("## PROJECT OVERVIEW\n");
    context.push_str(&format!("Project: {}\n", project.name));
    context.push_str(&format!("Current Agent: {}\n\n", role.display_name()));

    if !project.requirements.is_empty() {
        context.push_str("## EXISTING REQUIREMENTS\n");
        let mut listed = 0;
        for other in aide_core::AGENT_CHAIN {
            if other == role {
                continue;
            }
            if let Some(record) = project.requirements.get(&other) {
                if record.has_substance {
                    context.push_str(&format!(
                        "- {}: {}\n",
                        other.display_name(),
                        brief_summary(&record.response)
                    ));
                    listed += 1;
                }
            }
        }
        if listed == 0 {
            context.push_str("No substantial requirements gathered yet.\n");
        }
        context.push('\n');
    }

    let recent: Vec<_> = project
        .messages
        .iter()
        .rev()
        .take(RECENT_MESSAGES)
        .collect();
    if !recent.is_empty() {
        context.push_str("## RECENT CONVERSATION\n");
        for message in recent.into_iter().rev() {
            let who = match message.role {
                MessageRole::User => "User",
                MessageRole::Agent => "Assistant",
            };
            let text: String = message.content.chars().take(RECENT_MESSAGE_CHARS).collect();
            context.push_str(&format!("{}: {}\n", who, text));
        }
        context.push('\n');
    }

    context
}

/// Build the full prompt for a role answering the given user message.
pub fn role_prompt(role: AgentRole, user_message: &str, context: &str) -> String {
    format!(
        "{intro}\n\n{context}\n## CURRENT USER MESSAGE:\n{user_message}\n\n{body}\n## RESPONSE:",
        intro = role_intro(role),
        context = context,
        user_message = user_message,
        body = role_body(role),
    )
}

fn role_intro(role: AgentRole) -> &'static str {
    match role {
        AgentRole::RequirementsEvolver => {
            "You are a Requirements Evolver Agent. Your goal is to understand what the user wants to build."
        }
        AgentRole::UxArchitect => {
            "You are a UX Architect Agent. Your role is to design the user experience."
        }
        AgentRole::UiDesigner => {
            "You are a UI Designer Agent. Your role is to define the visual design."
        }
        AgentRole::FrontendEngineer => {
            "You are a Frontend Engineer Agent. Your role is technical implementation."
        }
        AgentRole::DataArchitect => {
            "You are a Data Architect Agent. Your role is data design."
        }
        AgentRole::ApiDesigner => {
            "You are an API Designer Agent. Your role is backend design."
        }
        AgentRole::DevOps => {
            "You are a DevOps Agent. Your role is deployment planning."
        }
    }
}

/// Prose replies only; the design-side roles must never emit code.
const NO_CODE_RULES: &str = "CRITICAL RULES - STRICTLY ENFORCED:\n\
     - ABSOLUTELY NO CODE GENERATION\n\
     - NEVER write HTML, CSS, JavaScript, or any programming code\n\
     - NEVER use code blocks, markdown formatting, or technical syntax\n\
     - ONLY provide specifications in plain, descriptive English\n\n";

fn role_body(role: AgentRole) -> String {
    match role {
        AgentRole::RequirementsEvolver => "## YOUR ROLE:\n\
             - Ask clarifying questions to understand their goals\n\
             - Identify key features and functionality needed\n\
             - Understand target users and their needs\n\
             - Note any technical constraints or preferences\n\n\
             ## GUIDELINES:\n\
             - Be conversational and focused\n\
             - Ask one clear question at a time\n\
             - Build on previous context when available\n\
             - When you have enough information, summarize requirements clearly\n"
            .to_string(),
        AgentRole::UxArchitect => "## YOUR FOCUS:\n\
             - User navigation and flow\n\
             - Page structure and layout\n\
             - Information architecture\n\
             - Mobile vs desktop experience\n\
             - User interaction patterns\n\n\
             ## GUIDELINES:\n\
             - Ask specific questions about user experience\n\
             - Suggest optimal navigation structures\n\
             - Consider different user scenarios\n\
             - When ready, provide UX specifications\n"
            .to_string(),
        AgentRole::UiDesigner => format!(
            "## YOUR FOCUS:\n\
             - Color schemes and themes\n\
             - Typography and fonts\n\
             - Layout and spacing\n\
             - Visual style and aesthetics\n\
             - Component design\n\n\
             {}\
             ## GUIDELINES:\n\
             - Ask about design preferences (colors, styles, themes)\n\
             - Describe colors using names or hex codes\n\
             - Describe layouts and visual elements conceptually\n\
             - When the user approves, provide final design specifications\n",
            NO_CODE_RULES
        ),
        AgentRole::FrontendEngineer => format!(
            "## YOUR FOCUS:\n\
             - JavaScript frameworks or vanilla JS\n\
             - Interactive features and functionality\n\
             - Performance considerations\n\
             - Browser compatibility\n\
             - Modern web standards\n\n\
             {}\
             ## GUIDELINES:\n\
             - Ask technical questions about implementation\n\
             - Suggest appropriate technologies\n\
             - Consider user experience requirements\n\
             - When ready, provide technical specifications\n",
            NO_CODE_RULES
        ),
        AgentRole::DataArchitect => format!(
            "## YOUR FOCUS:\n\
             - Data storage requirements\n\
             - Database design (SQL vs NoSQL)\n\
             - Data relationships and schema\n\
             - Security and privacy considerations\n\
             - Data validation and integrity\n\n\
             {}\
             ## GUIDELINES:\n\
             - Ask about data needs and storage\n\
             - Suggest appropriate database solutions\n\
             - Consider scalability requirements\n\
             - When ready, provide data architecture specs\n",
            NO_CODE_RULES
        ),
        AgentRole::ApiDesigner => "## YOUR FOCUS:\n\
             - API endpoints and routes\n\
             - Authentication and authorization\n\
             - Data formats (JSON, etc.)\n\
             - Backend functionality\n\
             - Error handling\n\n\
             ## GUIDELINES:\n\
             - Ask about API requirements\n\
             - Suggest RESTful design patterns\n\
             - Consider security requirements\n\
             - When ready, provide API specifications\n"
            .to_string(),
        AgentRole::DevOps => "## YOUR FOCUS:\n\
             - Deployment platforms and hosting\n\
             - Domain and SSL configuration\n\
             - Environment setup\n\
             - Scalability and performance\n\
             - Monitoring and maintenance\n\n\
             ## GUIDELINES:\n\
             - Ask about deployment preferences\n\
             - Suggest appropriate hosting solutions\n\
             - Consider budget and scale requirements\n\
             - When ready, provide deployment specifications\n"
            .to_string(),
    }
}
