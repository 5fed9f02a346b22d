//! Context-accumulating file generation.
//!
//! Files are generated strictly in plan order: every prompt embeds previews
//! of everything generated earlier in the same run, so later files can
//! reference earlier ones but never the reverse. The accumulated context is
//! an explicit value, which keeps a run replayable against a stubbed
//! completion service.

use std::path::Path;

use tracing::{info, warn};

use aide_chat::{CompletionClient, CompletionOptions};
use aide_core::{GeneratedFile, Project, AGENT_CHAIN};

use crate::extract;
use crate::validate;

/// Preview of an already-generated file, carried into later prompts.
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub path: String,
    pub preview: String,
}

/// Ordered previews of everything generated so far in one run.
#[derive(Debug, Clone, Default)]
pub struct ContextAccumulator {
    previews: Vec<FilePreview>,
}

/// Longest preview carried per generated file.
const PREVIEW_CHARS: usize = 500;

impl ContextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generated file for use in subsequent prompts.
    pub fn push(&mut self, file: &GeneratedFile) {
        let preview: String = file.content.chars().take(PREVIEW_CHARS).collect();
        self.previews.push(FilePreview {
            path: file.path.clone(),
            preview,
        });
    }

    pub fn previews(&self) -> &[FilePreview] {
        &self.previews
    }

    pub fn paths(&self) -> Vec<&str> {
        self.previews.iter().map(|p| p.path.as_str()).collect()
    }
}

/// Outcome of one generation run.
#[derive(Debug)]
pub struct GenerationRun {
    /// All produced records, in plan order, placeholders included.
    pub files: Vec<GeneratedFile>,
    /// How many files the plan asked for.
    pub planned: usize,
    /// How many files came back from the completion service.
    pub succeeded: usize,
}

/// Generate content for every planned path and write it under `src_dir`.
///
/// A completion failure for one file becomes a placeholder record; it never
/// aborts the rest of the run.
pub async fn generate_files(
    project: &Project,
    plan: &[String],
    completion: &dyn CompletionClient,
    src_dir: &Path,
) -> GenerationRun {
    let mut context = ContextAccumulator::new();
    let mut files = Vec::with_capacity(plan.len());
    let mut succeeded = 0;

    for path in plan {
        info!("Generating: {}", path);
        let prompt = file_prompt(project, path, &context);

        let content = match completion
            .complete(&prompt, &CompletionOptions::file_generation())
            .await
        {
            Ok(raw) => {
                succeeded += 1;
                let content = extract::extract_source(&raw);
                let verdict = validate::validate_content(path, &content);
                if !verdict.passed {
                    // Advisory only: the preview server is the real check.
                    warn!(
                        "Content validation warning for {} ({}), keeping output",
                        path,
                        verdict.reason.as_deref().unwrap_or("unspecified")
                    );
                }
                content
            }
            Err(e) => {
                warn!("File generation failed for {}: {}", path, e);
                format!("# Error generating {}. Please try again.\n# {}", path, e)
            }
        };

        let file = GeneratedFile::new(path.clone(), content);
        if let Err(e) = write_file(src_dir, &file) {
            warn!("Failed to write {}: {}", path, e);
        }
        context.push(&file);
        files.push(file);
    }

    info!("Generated {}/{} files successfully", succeeded, plan.len());

    GenerationRun {
        planned: plan.len(),
        succeeded,
        files,
    }
}

fn write_file(src_dir: &Path, file: &GeneratedFile) -> std::io::Result<()> {
    let full_path = src_dir.join(&file.path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full_path, &file.content)
}

/// Build the full generation prompt for one file.
fn file_prompt(project: &Project, path: &str, context: &ContextAccumulator) -> String {
    format!(
        "# GENERATE {path} for {name}\n\n\
         ## PROJECT OVERVIEW:\n{requirements}\n\
         ## EXISTING FILES (INTEGRATE WITH THESE):\n{files}\n\n\
         ## INTEGRATION GUIDANCE:\n{guidance}\n\n\
         ## FILE-SPECIFIC REQUIREMENTS:\n{file_requirements}\n\n\
         ## CRITICAL RULES:\n\
         1. Generate COMPLETE, WORKING code for {path}\n\
         2. NO explanations, NO markdown, NO comments about the code\n\
         3. MUST integrate seamlessly with existing file structure\n\
         4. MUST follow Flask + Vanilla JavaScript architecture\n\
         5. Code must be production-ready and well-structured\n\n\
         ## OUTPUT:\n\
         Pure, complete code only - no additional text:\n",
        path = path,
        name = project.name,
        requirements = requirements_context(project),
        files = file_context(context),
        guidance = integration_guidance(path, &context.paths()),
        file_requirements = file_requirements(path, project),
    )
}

fn requirements_context(project: &Project) -> String {
    if project.requirements.is_empty() {
        return "Create a complete, functional web application with Flask backend and modern frontend.\n".to_string();
    }

    let mut context = String::from("## Project Requirements by Domain:\n\n");
    for role in AGENT_CHAIN {
        if let Some(record) = project.requirements.get(&role) {
            if record.response.is_empty() {
                continue;
            }
            let sentences: Vec<&str> = record
                .response
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(3)
                .collect();
            let key_points = if sentences.is_empty() {
                record.response.chars().take(300).collect::<String>()
            } else {
                format!("{}.", sentences.join(". "))
            };
            context.push_str(&format!("### {}:\n{}\n\n", role.display_name(), key_points));
        }
    }
    context
}

fn file_context(context: &ContextAccumulator) -> String {
    if context.previews().is_empty() {
        return "No other files generated yet. Create a complete foundation.".to_string();
    }

    let previews = context.previews();
    let python: Vec<_> = previews.iter().filter(|f| f.path.ends_with(".py")).collect();
    let templates: Vec<_> = previews
        .iter()
        .filter(|f| f.path.starts_with("templates/"))
        .collect();
    let statics: Vec<_> = previews
        .iter()
        .filter(|f| f.path.starts_with("static/"))
        .collect();
    let other: Vec<_> = previews
        .iter()
        .filter(|f| {
            !f.path.ends_with(".py")
                && !f.path.starts_with("templates/")
                && !f.path.starts_with("static/")
        })
        .collect();

    let mut out = String::from("## Files already created:\n");

    if !python.is_empty() {
        out.push_str("\n### Python Files:\n");
        for f in python {
            out.push_str(&format!("- {}: {}\n", f.path, clip(&f.preview, 200)));
        }
    }
    if !templates.is_empty() {
        out.push_str("\n### Template Files:\n");
        for f in templates {
            out.push_str(&format!("- {}: {}\n", f.path, clip(&f.preview, 150)));
        }
    }
    if !statics.is_empty() {
        out.push_str("\n### Static Files:\n");
        for f in statics {
            let kind = if f.path.ends_with(".css") {
                "CSS"
            } else if f.path.ends_with(".js") {
                "JS"
            } else {
                "Static"
            };
            out.push_str(&format!(
                "- {} ({}): {}\n",
                f.path,
                kind,
                clip(&f.preview, 100)
            ));
        }
    }
    if !other.is_empty() {
        out.push_str("\n### Other Files:\n");
        for f in other {
            out.push_str(&format!("- {}\n", f.path));
        }
    }

    out
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

fn integration_guidance(path: &str, existing: &[&str]) -> String {
    let mut guidance: Vec<String> = Vec::new();
    let has = |p: &str| existing.contains(&p);

    if path == "app.py" {
        if has("templates/index.html") {
            guidance.push(
                "Integrate with existing templates/index.html using render_template()".into(),
            );
        }
        if has("static/css/style.css") {
            guidance.push("Reference static/css/style.css in your templates".into());
        }
        if has("static/js/app.js") {
            guidance.push("Ensure your routes work with static/js/app.js functionality".into());
        }
        guidance.extend([
            "Define clear Flask routes with proper error handling".into(),
            "Include all necessary imports (Flask, render_template, request, jsonify)".into(),
            "Implement input validation for all user inputs".into(),
            "Use proper JSON responses for API endpoints".into(),
        ]);
    } else if path.ends_with(".html") && path.starts_with("templates/") {
        if has("app.py") {
            guidance.push("Ensure your HTML forms point to correct Flask routes from app.py".into());
        }
        if has("static/css/style.css") {
            guidance.push(
                "Link to static/css/style.css using url_for('static', filename='css/style.css')"
                    .into(),
            );
        }
        if has("static/js/app.js") {
            guidance.push("Include static/js/app.js using proper script tags".into());
        }
        guidance.extend([
            "Use semantic HTML5 structure".into(),
            "Implement proper form structure with labels and inputs".into(),
            "Use Jinja2 templating if extending other templates".into(),
        ]);
    } else if path.ends_with(".css") {
        guidance.extend([
            "Create responsive design that works on mobile and desktop".into(),
            "Use modern CSS features (Flexbox/Grid)".into(),
            "Define clear color scheme and typography".into(),
            "Style all components mentioned in requirements".into(),
        ]);
    } else if path.ends_with(".js") {
        if has("app.py") {
            guidance.push("Connect to Flask backend routes defined in app.py".into());
        }
        guidance.extend([
            "Use vanilla JavaScript only - no frameworks".into(),
            "Implement proper error handling for API calls".into(),
            "Handle form submissions and user interactions".into(),
            "Update DOM elements based on API responses".into(),
        ]);
    }

    guidance
        .iter()
        .map(|g| format!("- {}", g))
        .collect::<Vec<_>>()
        .join("\n")
}

fn file_requirements(path: &str, project: &Project) -> String {
    let base = match path {
        "app.py" => {
            "- Create complete Flask application\n\
             - Define all necessary routes based on project requirements\n\
             - Include proper error handling and input validation\n\
             - Use render_template() for HTML responses"
        }
        "templates/index.html" => {
            "- Create complete HTML page structure\n\
             - Include all UI components mentioned in requirements\n\
             - Ensure responsive design foundation\n\
             - Include proper meta tags and accessibility features"
        }
        "static/css/style.css" => {
            "- Create comprehensive CSS stylesheet\n\
             - Implement responsive design for all screen sizes\n\
             - Define complete color scheme and typography\n\
             - Style all UI components from requirements"
        }
        "static/js/app.js" => {
            "- Create complete JavaScript functionality\n\
             - Handle all user interactions from requirements\n\
             - Implement API communication with Flask backend\n\
             - Include proper error handling and user feedback"
        }
        "requirements.txt" => {
            "- List all Python dependencies for Flask project\n\
             - Include Flask and any additional packages needed\n\
             - Use proper version pinning for production readiness"
        }
        _ => "- Create appropriate content for this file type",
    };

    format!("{}{}", base, specific_requirements(path, project))
}

/// Extra requirements lifted from the extracted technical specs.
fn specific_requirements(path: &str, project: &Project) -> String {
    let mut specific = String::new();

    for record in project.requirements.values() {
        let specs = &record.technical_specs;

        if path == "app.py" {
            if let Some(api_type) = specs.get("api_type").and_then(|v| v.as_str()) {
                specific.push_str(&format!(
                    "\n- Implement {} API design",
                    api_type.to_uppercase()
                ));
            }
        }
        if path.ends_with(".css") {
            if let Some(colors) = specs.get("colors").and_then(|v| v.as_array()) {
                let listed: Vec<&str> = colors.iter().filter_map(|c| c.as_str()).collect();
                if !listed.is_empty() {
                    specific.push_str(&format!("\n- Use color scheme: {}", listed.join(", ")));
                }
            }
            if let Some(style) = specs.get("style").and_then(|v| v.as_str()) {
                specific.push_str(&format!("\n- Implement {} design style", style));
            }
        }
        if path.ends_with(".js") {
            if let Some(framework) = specs.get("framework").and_then(|v| v.as_str()) {
                specific.push_str(&format!(
                    "\n- Use {} approach (vanilla JS only)",
                    framework
                ));
            }
        }
    }

    specific
}
