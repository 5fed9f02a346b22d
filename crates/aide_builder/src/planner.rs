//! Structure planning: one completion call turned into a clean file list.
//!
//! The model is asked for a newline-delimited list of paths; everything
//! after that is defensive post-processing, because small models happily
//! echo code, prose or markdown instead. Planning never hard-fails: when
//! the completion call itself dies, the baseline set is the plan.

use tracing::warn;

use aide_chat::{CompletionClient, CompletionOptions};
use aide_core::Project;

/// Every plan contains at least these files.
pub const BASELINE_FILES: [&str; 5] = [
    "app.py",
    "requirements.txt",
    "templates/index.html",
    "static/css/style.css",
    "static/js/app.js",
];

/// Extensions a planned path may carry.
const VALID_EXTENSIONS: [&str; 7] = [".py", ".html", ".css", ".js", ".json", ".md", ".txt"];

/// Line fragments that mark a model reply line as code rather than a path.
const CODE_MARKERS: [&str; 8] = [
    "from ", "import ", "@app", "def ", "class ", "<!DOCTYPE", "// ", "/*",
];

/// Alias groups for the same logical artifact; exactly one canonical nested
/// path survives per group.
const CONFLICT_GROUPS: [&[&str]; 3] = [
    &["index.html", "templates/index.html"],
    &["style.css", "static/css/style.css", "styles.css"],
    &["app.js", "static/js/app.js", "scripts.js"],
];

/// Ask the completion service for a project structure and post-process the
/// reply into a conflict-free plan containing the baseline set.
pub async fn plan_structure(project: &Project, completion: &dyn CompletionClient) -> Vec<String> {
    let prompt = planning_prompt(project);

    match completion
        .complete(&prompt, &CompletionOptions::planning())
        .await
    {
        Ok(response) => parse_file_list(&response),
        Err(e) => {
            warn!("Structure planning failed, using baseline set: {}", e);
            BASELINE_FILES.iter().map(|s| s.to_string()).collect()
        }
    }
}

fn planning_prompt(project: &Project) -> String {
    format!(
        "# TASK: Plan MINIMAL Flask project structure\n\n\
         ## PROJECT: {} ({})\n\n\
         ## REQUIREMENTS SUMMARY:\n{}\n\n\
         ## INSTRUCTIONS:\n\
         1. Analyze ALL requirements and list ONLY essential files\n\
         2. Focus on Flask best practices - keep it simple but functional\n\
         3. List ONE file path per line\n\
         4. Include ONLY: app.py, requirements.txt, templates/, static/ files\n\
         5. NO duplicates, NO unnecessary files\n\n\
         ## ESSENTIAL FILES (adapt based on requirements):\n\
         app.py\n\
         requirements.txt\n\
         templates/index.html\n\
         static/css/style.css\n\
         static/js/app.js\n\
         README.md\n\n\
         ## FILE LIST:",
        project.name,
        project.id,
        requirements_summary(project)
    )
}

fn requirements_summary(project: &Project) -> String {
    let mut parts = Vec::new();
    for role in aide_core::AGENT_CHAIN {
        if let Some(record) = project.requirements.get(&role) {
            let head = record
                .response
                .split('.')
                .next()
                .unwrap_or(&record.response);
            let head: String = head.chars().take(200).collect();
            if head.trim().len() > 20 {
                parts.push(format!("{}: {}", role, head.trim()));
            }
        }
    }
    if parts.is_empty() {
        "Create a functional web application.".to_string()
    } else {
        parts.join("\n")
    }
}

/// Turn a raw model reply into the final plan: filter, normalize, resolve
/// conflicts, guarantee the baseline.
pub fn parse_file_list(response: &str) -> Vec<String> {
    let mut files = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if CODE_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }
        if line.chars().any(|c| "(){}[]=".contains(c)) {
            continue;
        }
        if line.starts_with('#') || line.starts_with("//") || line.contains("://") {
            continue;
        }

        // Strip trailing inline commentary.
        let clean = line.split('#').next().unwrap_or("").trim();
        if clean.is_empty() {
            continue;
        }

        let looks_like_path = VALID_EXTENSIONS.iter().any(|ext| clean.ends_with(ext))
            || (clean.contains('/') && clean.rsplit('/').next().is_some_and(|f| f.contains('.')));
        if !looks_like_path {
            continue;
        }
        if clean.len() >= 100
            || clean.chars().any(|c| "*?\"<>|".contains(c))
            || clean.ends_with('/')
        {
            continue;
        }

        files.push(normalize_path(clean));
    }

    let mut resolved = resolve_conflicts(files);

    for essential in BASELINE_FILES {
        if !resolved.iter().any(|f| f == essential) {
            resolved.push(essential.to_string());
        }
    }

    resolved
}

/// Map well-known bare filenames to their canonical nested location.
pub fn normalize_path(path: &str) -> String {
    match path {
        "style.css" | "styles.css" => "static/css/style.css",
        "app.js" | "scripts.js" => "static/js/app.js",
        "index.html" => "templates/index.html",
        other => other,
    }
    .to_string()
}

/// Collapse alias groups to one canonical path each, preserving first-seen
/// order for everything else.
pub fn resolve_conflicts(files: Vec<String>) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();

    for file in files {
        let group = CONFLICT_GROUPS
            .iter()
            .find(|group| group.contains(&file.as_str()));

        match group {
            Some(group) => {
                let canonical = group
                    .iter()
                    .find(|f| f.starts_with("templates/") || f.starts_with("static/"));
                if let Some(canonical) = canonical {
                    if !resolved.iter().any(|f| f == canonical) {
                        resolved.push(canonical.to_string());
                    }
                }
            }
            None => {
                if !resolved.contains(&file) {
                    resolved.push(file);
                }
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use aide_chat::{ChatError, ChatResult};
    use async_trait::async_trait;

    struct FailingCompletion;

    #[async_trait]
    impl CompletionClient for FailingCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> ChatResult<String> {
            Err(ChatError::Completion("service unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn completion_failure_falls_back_to_the_baseline() {
        let plan = plan_structure(&Project::new("p"), &FailingCompletion).await;
        assert_eq!(
            plan,
            BASELINE_FILES
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn well_formed_reply_parses_to_paths() {
        let reply = "app.py\nrequirements.txt\ntemplates/index.html\nstatic/css/style.css\nstatic/js/app.js\nREADME.md";
        let plan = parse_file_list(reply);
        assert!(plan.contains(&"README.md".to_string()));
        for baseline in BASELINE_FILES {
            assert!(plan.contains(&baseline.to_string()));
        }
    }

    #[test]
    fn code_and_markup_lines_are_dropped() {
        let reply = "from flask import Flask\n\
                     @app.route('/')\n\
                     def index():\n\
                     <!DOCTYPE html>\n\
                     // comment\n\
                     x = 5\n\
                     app.py";
        let plan = parse_file_list(reply);
        assert_eq!(plan.iter().filter(|f| *f == "app.py").count(), 1);
        assert!(!plan.iter().any(|f| f.contains("flask")));
        assert_eq!(plan.len(), BASELINE_FILES.len());
    }

    #[test]
    fn garbage_reply_still_yields_the_baseline() {
        let plan = parse_file_list("Sure! Here is an explanation of what I would build for you.");
        assert_eq!(
            plan,
            BASELINE_FILES
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn bare_aliases_normalize_to_nested_paths() {
        assert_eq!(normalize_path("style.css"), "static/css/style.css");
        assert_eq!(normalize_path("scripts.js"), "static/js/app.js");
        assert_eq!(normalize_path("index.html"), "templates/index.html");
        assert_eq!(normalize_path("templates/about.html"), "templates/about.html");
    }

    #[test]
    fn conflict_groups_keep_exactly_one_canonical_path() {
        let resolved = resolve_conflicts(vec![
            "style.css".to_string(),
            "static/css/style.css".to_string(),
        ]);
        assert_eq!(resolved, vec!["static/css/style.css".to_string()]);
    }

    #[test]
    fn conflicting_aliases_in_a_reply_dedupe() {
        let reply = "style.css\nstatic/css/style.css\ntemplates/index.html\nindex.html";
        let plan = parse_file_list(reply);
        assert_eq!(
            plan.iter().filter(|f| *f == "static/css/style.css").count(),
            1
        );
        assert_eq!(
            plan.iter().filter(|f| *f == "templates/index.html").count(),
            1
        );
        assert!(!plan.iter().any(|f| f == "style.css" || f == "index.html"));
    }

    #[test]
    fn oversized_and_illegal_paths_are_dropped() {
        let long = format!("static/{}.css", "x".repeat(120));
        let reply = format!("{}\nbad|name.js\ntrailing/", long);
        let plan = parse_file_list(&reply);
        assert_eq!(plan.len(), BASELINE_FILES.len());
    }

    #[test]
    fn first_seen_order_is_preserved() {
        let reply = "README.md\napp.py\ntemplates/about.html";
        let plan = parse_file_list(reply);
        assert_eq!(plan[0], "README.md");
        assert_eq!(plan[1], "app.py");
        assert_eq!(plan[2], "templates/about.html");
    }
}
