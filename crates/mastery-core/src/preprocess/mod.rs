use crate::{Error, MasteryConfig, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct PreprocessResult {
    pub code: String,
    pub title: Option<String>,
    pub config: MasteryConfig,
}

/// Normalizes raw diagram text ahead of the repair passes: code fences, line
/// endings, smart punctuation, numbered-list artifacts, YAML front-matter.
///
/// Comment lines (`%%`) are preserved untouched.
pub fn preprocess_diagram(input: &str) -> Result<PreprocessResult> {
    let cleaned = cleanup_text(input);
    let (code, title, config) = process_frontmatter(&cleaned)?;

    // A dangling `---` line after extraction is an unterminated front-matter
    // block, not diagram content.
    if first_nonempty_line(&code).is_some_and(|line| line.trim() == "---") {
        return Err(Error::MalformedFrontMatter);
    }

    Ok(PreprocessResult {
        code,
        title,
        config,
    })
}

pub(crate) fn cleanup_text(input: &str) -> String {
    let s = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let s = crlf_regex().replace_all(s, "\n").to_string();
    let s = strip_fence_lines(&s);
    let s = normalize_smart_punctuation(&s);
    strip_list_numbering(&s)
}

fn first_nonempty_line(text: &str) -> Option<&str> {
    text.lines().find(|line| !line.trim().is_empty())
}

/// Drops Markdown code-fence marker lines (with or without an info string)
/// wherever they appear; models fence diagrams and occasionally leave stray
/// markers mid-reply.
fn strip_fence_lines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            continue;
        }
        out.push_str(line);
    }
    out
}

fn normalize_smart_punctuation(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

/// Strips `1. ` / `2) ` prefixes models prepend when they format a diagram as
/// an ordered list.
fn strip_list_numbering(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        out.push_str(&list_numbering_regex().replace(line, ""));
    }
    out
}

fn process_frontmatter(input: &str) -> Result<(String, Option<String>, MasteryConfig)> {
    let Some(caps) = frontmatter_regex().captures(input) else {
        return Ok((input.to_string(), None, MasteryConfig::empty_object()));
    };

    let yaml_body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let raw_yaml: serde_yaml::Value =
        serde_yaml::from_str(yaml_body).map_err(|e| Error::InvalidFrontMatterYaml {
            message: e.to_string(),
        })?;

    let parsed = serde_json::to_value(raw_yaml).unwrap_or(Value::Null);
    let parsed_obj = parsed.as_object().cloned().unwrap_or_default();

    let mut title = None;
    if let Some(Value::String(t)) = parsed_obj.get("title") {
        title = Some(t.clone());
    }

    let mut config = MasteryConfig::empty_object();
    if let Some(v) = parsed_obj.get("config") {
        config.deep_merge(v);
    }

    let stripped = input[caps.get(0).map(|m| m.end()).unwrap_or(0)..].to_string();
    Ok((stripped, title, config))
}

fn crlf_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n?").expect("valid regex"))
}

fn list_numbering_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s+").expect("valid regex"))
}

fn frontmatter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").expect("valid regex")
    })
}
