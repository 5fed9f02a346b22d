//! Source extraction from raw completion replies.
//!
//! Models wrap code in fences and preface it with prose. Extraction keeps
//! the interior of fences, drops leading explanation lines until something
//! looks like code, and falls back to the raw reply rather than returning
//! nothing.

/// Openers that mark a leading line as explanation rather than code.
const PROSE_OPENERS: [&str; 5] = ["this is", "here is", "the following", "sure,", "certainly,"];

/// Extract source content from a raw completion reply.
pub fn extract_source(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    // Strip fence delimiters, keep their interior.
    let mut without_fences = String::with_capacity(raw.len());
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            continue;
        }
        without_fences.push_str(line);
        without_fences.push('\n');
    }

    // Drop leading prose until the first code-looking line.
    let mut kept: Vec<&str> = Vec::new();
    let mut found_code = false;
    for line in without_fences.lines() {
        if !found_code {
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }
            let lower = stripped.to_lowercase();
            let is_prose = PROSE_OPENERS.iter().any(|p| lower.starts_with(p))
                && !looks_like_code(stripped);
            if is_prose {
                continue;
            }
            found_code = true;
        }
        kept.push(line);
    }

    let result = kept.join("\n").trim().to_string();
    if result.len() < 10 {
        // Stripping ate everything worth keeping; trust the raw reply.
        return raw.trim().to_string();
    }
    result
}

fn looks_like_code(line: &str) -> bool {
    line.contains('{') || line.contains('<') || line.contains("import")
}
