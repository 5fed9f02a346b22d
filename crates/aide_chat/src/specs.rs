//! Reply post-processing: summaries, technical-spec extraction and code
//! filtering for the design-side roles.

use std::collections::HashMap;

use serde_json::{json, Value};

use aide_core::AgentRole;

/// Summary stored in the requirement ledger: the first meaningful lines of a
/// reply, capped at 200 characters.
pub fn summarize_response(response: &str) -> String {
    if response.len() <= 200 {
        return response.to_string();
    }

    let mut meaningful = Vec::new();
    for line in response.lines() {
        let stripped = line.trim();
        if stripped.is_empty()
            || stripped.starts_with('#')
            || stripped.starts_with("//")
            || stripped.starts_with("/*")
            || stripped.len() <= 10
        {
            continue;
        }
        meaningful.push(stripped);
        if meaningful.join("\n").len() > 150 {
            break;
        }
    }

    let mut summary = meaningful.join("\n");
    if summary.is_empty() {
        summary = response.to_string();
    }
    if summary.len() > 200 {
        summary = format!("{}...", truncate_chars(&summary, 197));
    }
    summary
}

/// One-line summary for context blocks: the first sentence, or a truncated
/// head of the reply.
pub fn brief_summary(response: &str) -> String {
    if response.len() <= 100 {
        return response.to_string();
    }
    if let Some(first) = response.split('.').next() {
        if first.len() > 20 {
            return format!("{}...", first);
        }
    }
    format!("{}...", truncate_chars(response, 97))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Extract key/value technical specs from a reply, per role.
pub fn extract_technical_specs(role: AgentRole, response: &str) -> HashMap<String, Value> {
    let mut specs = HashMap::new();
    let lower = response.to_lowercase();

    // Cross-role signals.
    if lower.contains("responsive") || lower.contains("mobile") {
        specs.insert("responsive".to_string(), json!(true));
    }
    if lower.contains("modern") {
        specs.insert("style".to_string(), json!("modern"));
    }
    if lower.contains("minimal") || lower.contains("clean") {
        specs.insert("style".to_string(), json!("minimal"));
    }

    match role {
        AgentRole::UiDesigner => extract_design_specs(response, &lower, &mut specs),
        AgentRole::UxArchitect => extract_ux_specs(&lower, &mut specs),
        AgentRole::FrontendEngineer => extract_frontend_specs(&lower, &mut specs),
        AgentRole::DataArchitect => extract_data_specs(&lower, &mut specs),
        AgentRole::ApiDesigner => extract_api_specs(&lower, &mut specs),
        AgentRole::DevOps => extract_devops_specs(&lower, &mut specs),
        AgentRole::RequirementsEvolver => {}
    }

    specs
}

fn extract_design_specs(response: &str, lower: &str, specs: &mut HashMap<String, Value>) {
    if let Ok(color_re) = regex::Regex::new(r"#([a-fA-F0-9]{6}|[a-fA-F0-9]{3})") {
        let colors: Vec<String> = color_re
            .find_iter(response)
            .take(3)
            .map(|m| m.as_str().to_string())
            .collect();
        if !colors.is_empty() {
            specs.insert("colors".to_string(), json!(colors));
        }
    }

    if lower.contains("single page") || lower.contains("spa") {
        specs.insert("layout".to_string(), json!("single-page"));
    } else if lower.contains("multi-page") || lower.contains("multiple pages") {
        specs.insert("layout".to_string(), json!("multi-page"));
    }
}

fn extract_ux_specs(lower: &str, specs: &mut HashMap<String, Value>) {
    if lower.contains("simple") || lower.contains("basic") {
        specs.insert("complexity".to_string(), json!("simple"));
    } else if lower.contains("complex") || lower.contains("advanced") {
        specs.insert("complexity".to_string(), json!("complex"));
    }
}

fn extract_frontend_specs(lower: &str, specs: &mut HashMap<String, Value>) {
    let frameworks: &[(&str, &[&str])] = &[
        ("vue", &["vue", "vue.js"]),
        ("react", &["react", "react.js"]),
        ("angular", &["angular"]),
        ("vanilla", &["vanilla", "plain javascript", "native javascript"]),
    ];
    for (framework, keywords) in frameworks {
        if keywords.iter().any(|k| lower.contains(k)) {
            specs.insert("framework".to_string(), json!(framework));
            break;
        }
    }
}

fn extract_data_specs(lower: &str, specs: &mut HashMap<String, Value>) {
    if ["sql", "postgres", "mysql"].iter().any(|w| lower.contains(w)) {
        specs.insert("database".to_string(), json!("sql"));
    } else if ["nosql", "mongodb"].iter().any(|w| lower.contains(w)) {
        specs.insert("database".to_string(), json!("nosql"));
    } else if lower.contains("local storage") || lower.contains("browser storage") {
        specs.insert("database".to_string(), json!("local"));
    }
}

fn extract_api_specs(lower: &str, specs: &mut HashMap<String, Value>) {
    if lower.contains("rest") {
        specs.insert("api_type".to_string(), json!("rest"));
    } else if lower.contains("graphql") {
        specs.insert("api_type".to_string(), json!("graphql"));
    }
}

fn extract_devops_specs(lower: &str, specs: &mut HashMap<String, Value>) {
    let platforms: &[(&str, &[&str])] = &[
        ("netlify", &["netlify"]),
        ("vercel", &["vercel"]),
        ("heroku", &["heroku"]),
        ("aws", &["aws", "amazon"]),
        ("docker", &["docker", "container"]),
    ];
    for (platform, keywords) in platforms {
        if keywords.iter().any(|k| lower.contains(k)) {
            specs.insert("platform".to_string(), json!(platform));
            break;
        }
    }
}

/// Strip code-shaped fragments from a design reply, keeping the prose.
pub fn filter_code_from_reply(response: &str) -> String {
    let patterns = [
        r"(?is)```[a-z]*\n.*?\n```",
        r"<[^>]+>",
        r"(?i)function\s*\([^)]*\)",
        r"(?i)const\s+\w+\s*=",
        r"(?i)let\s+\w+\s*=",
        r"(?i)var\s+\w+\s*=",
        r"(?is)import\s+.*?from",
        r"(?is)from\s+.*?import",
        r"(?i)def\s+\w+\s*\([^)]*\):",
        r"(?i)class\s+\w+",
    ];

    let mut cleaned = response.to_string();
    for pattern in patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            cleaned = re.replace_all(&cleaned, "").to_string();
        }
    }
    cleaned.trim().to_string()
}

/// Whether a reply still looks like it carries code after filtering.
pub fn contains_code_patterns(text: &str) -> bool {
    let lower = text.to_lowercase();
    [
        "<html", "<div", "<script", "function(", "const ", "let ", "import ", "from ", "def ",
        "class ", "@app", "render_template", "={", "=>", "();", "```",
    ]
    .iter()
    .any(|indicator| lower.contains(indicator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_responses_summarize_to_themselves() {
        assert_eq!(summarize_response("A short plan."), "A short plan.");
    }

    #[test]
    fn long_responses_are_capped_with_ellipsis() {
        let long = "The application layout follows a sidebar pattern. ".repeat(20);
        let summary = summarize_response(&long);
        assert!(summary.len() <= 200);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn summaries_skip_markup_lines() {
        let response = format!(
            "# Heading\n// comment line\nThe main page shows the active tasks grouped by day.\n{}",
            "More detail follows here in several additional sentences. ".repeat(10)
        );
        let summary = summarize_response(&response);
        assert!(summary.starts_with("The main page"));
    }

    #[test]
    fn design_specs_capture_colors_and_layout() {
        let specs = extract_technical_specs(
            AgentRole::UiDesigner,
            "Primary color #3B82F6 with accents #F59E0B, a clean single page layout.",
        );
        assert_eq!(specs["colors"], json!(["#3B82F6", "#F59E0B"]));
        assert_eq!(specs["layout"], json!("single-page"));
        assert_eq!(specs["style"], json!("minimal"));
    }

    #[test]
    fn frontend_specs_capture_first_framework_mentioned() {
        let specs = extract_technical_specs(
            AgentRole::FrontendEngineer,
            "Vanilla JavaScript is enough; no need for React here.",
        );
        // Table order decides: vue/react are checked before vanilla.
        assert_eq!(specs["framework"], json!("react"));
    }

    #[test]
    fn devops_specs_capture_platform() {
        let specs = extract_technical_specs(
            AgentRole::DevOps,
            "Host it on Netlify with automatic deployments from the main branch.",
        );
        assert_eq!(specs["platform"], json!("netlify"));
    }

    #[test]
    fn code_filter_strips_fences_and_tags() {
        let reply = "Use a blue scheme.\n```css\nbody { color: blue; }\n```\nWith <div> wrappers.";
        let cleaned = filter_code_from_reply(reply);
        assert!(cleaned.contains("Use a blue scheme."));
        assert!(!cleaned.contains("body {"));
        assert!(!cleaned.contains("<div>"));
    }

    #[test]
    fn code_detection_flags_markup_and_declarations() {
        assert!(contains_code_patterns("<div class=\"card\">"));
        assert!(contains_code_patterns("const items = []"));
        assert!(!contains_code_patterns(
            "A calm palette with rounded corners and subtle shadows."
        ));
    }
}
