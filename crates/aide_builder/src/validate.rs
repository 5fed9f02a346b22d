//! Advisory content validators.
//!
//! Pure classifiers: each returns a pass/fail verdict with a reason and
//! never decides acceptance. The pipeline trusts generated content over
//! these heuristics and defers real correctness checking to the preview
//! server; callers may later choose to make a verdict blocking without
//! touching the classifiers.

/// Verdict of one content check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub passed: bool,
    pub reason: Option<String>,
}

impl Validation {
    fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Classify generated content for the given path.
pub fn validate_content(path: &str, content: &str) -> Validation {
    let trimmed = content.trim();
    if trimmed.len() < 5 {
        return Validation::fail("content too short");
    }

    if path.ends_with(".py") || path == "requirements.txt" {
        validate_python(path, trimmed)
    } else if path.ends_with(".html") {
        validate_html(trimmed)
    } else if path.ends_with(".css") {
        validate_css(trimmed)
    } else if path.ends_with(".js") {
        validate_javascript(trimmed)
    } else if path.ends_with(".txt") || path.ends_with(".md") {
        Validation::pass()
    } else {
        Validation::pass()
    }
}

fn validate_python(path: &str, content: &str) -> Validation {
    let lower = content.to_lowercase();

    if path == "app.py" {
        let flask_indicators = [
            lower.contains("flask"),
            content.contains("@app"),
            content.contains("render_template"),
        ];
        if flask_indicators.iter().any(|&found| found) || content.len() > 100 {
            Validation::pass()
        } else {
            Validation::fail("missing Flask indicators")
        }
    } else if path == "requirements.txt" {
        if content.contains(&['=', '>', '<', '\n'][..]) {
            Validation::pass()
        } else {
            Validation::fail("not a valid requirements format")
        }
    } else {
        let python_indicators = [
            "import ", "def ", "class ", "from ", "print(", "return ",
        ];
        if python_indicators.iter().any(|i| content.contains(i)) || content.len() > 50 {
            Validation::pass()
        } else {
            Validation::fail("no Python structure found")
        }
    }
}

fn validate_html(content: &str) -> Validation {
    let lower = content.to_lowercase();
    let html_indicators = [
        lower.contains("<!doctype"),
        lower.contains("<html"),
        lower.contains("<head"),
        lower.contains("<body"),
        content.contains("<div"),
        content.contains("<p>"),
        content.contains("<h1"),
        content.contains("<form"),
    ];
    if html_indicators.iter().any(|&found| found) && content.contains('<') && content.contains('>')
    {
        Validation::pass()
    } else {
        Validation::fail("no HTML structure found")
    }
}

fn validate_css(content: &str) -> Validation {
    if content.len() < 10 {
        return Validation::fail("content too short for a stylesheet");
    }

    let lower = content.to_lowercase();
    let css_indicators = [
        content.contains('{') && content.contains('}'),
        content.contains(&[':', ';', '#', '.'][..]),
        ["color", "font", "margin", "padding", "width", "height"]
            .iter()
            .any(|w| lower.contains(w)),
    ];
    let has_any_css = css_indicators.iter().any(|&found| found);
    let balanced_braces =
        content.matches('{').count() == content.matches('}').count();

    if has_any_css || (balanced_braces && content.len() > 25) {
        Validation::pass()
    } else {
        Validation::fail("no CSS structure found")
    }
}

fn validate_javascript(content: &str) -> Validation {
    let lower = content.to_lowercase();
    let js_indicators = [
        content.contains("function"),
        content.contains("const "),
        content.contains("let "),
        content.contains("document."),
        lower.contains("addeventlistener"),
        lower.contains("getelementbyid"),
        content.contains("fetch"),
    ];
    // The generated app is vanilla JS; framework imports mean the model
    // wandered off target.
    let has_framework = ["import react", "from react", "vue", "angular"]
        .iter()
        .any(|fw| lower.contains(fw));

    if has_framework {
        Validation::fail("contains framework code")
    } else if js_indicators.iter().any(|&found| found) || content.len() > 50 {
        Validation::pass()
    } else {
        Validation::fail("no JavaScript structure found")
    }
}
