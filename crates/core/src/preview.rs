//! Simplified HTML preview of generated Markdown.
//!
//! Covers only the dialect the formatter emits: ATX headings, inline links,
//! autolinks, emphasis, rules and paragraphs. Not a general Markdown renderer.

use std::sync::OnceLock;

use regex::Regex;

struct Rule {
    re: Regex,
    replacement: &'static str,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(?m)^### (.+)$", "<h3>$1</h3>"),
            (r"(?m)^## (.+)$", "<h2>$1</h2>"),
            (r"(?m)^# (.+)$", "<h1>$1</h1>"),
            (
                r"\[([^\]]+)\]\(([^)]+)\)",
                r#"<a href="$2" target="_blank">$1</a>"#,
            ),
            (
                r"&lt;(https?://[^\s<>]+?)&gt;",
                r#"<a href="$1" target="_blank">$1</a>"#,
            ),
            (r"\*\*([^*]+)\*\*", "<strong>$1</strong>"),
            (r"\*([^*]+)\*", "<em>$1</em>"),
            (r"(?m)^---$", "<hr>"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rule {
            re: Regex::new(pattern).unwrap(),
            replacement,
        })
        .collect()
    })
}

fn unwrap_rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"<p></p>", ""),
            (r"<p>(<h[1-6]>)", "$1"),
            (r"(</h[1-6]>)</p>", "$1"),
            (r"<p>(<hr>)</p>", "$1"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rule {
            re: Regex::new(pattern).unwrap(),
            replacement,
        })
        .collect()
    })
}

/// Render Markdown to a preview HTML fragment.
///
/// Text is HTML-escaped before any markup is produced, so anchor text and
/// body text cannot inject tags.
pub fn to_html(markdown: &str) -> String {
    let mut html = html_escape::encode_text(markdown).to_string();

    for rule in rules() {
        html = rule.re.replace_all(&html, rule.replacement).to_string();
    }

    html = html.replace("\n\n", "</p><p>").replace('\n', "<br>");
    html = format!("<p>{html}</p>");

    for rule in unwrap_rules() {
        html = rule.re.replace_all(&html, rule.replacement).to_string();
    }

    html
}
