//! Structured pedagogical response extraction.
//!
//! The tutoring system prompt asks the model to answer in four sections:
//! principle, analogy, application, diagram. Models follow that loosely
//! (`# Principle`, `**Analogy:**`, bare `Application:` lines), so the split
//! is tolerant and anything unmatched stays available through `raw`.

use crate::config::SanitizeOptions;
use crate::sanitize::sanitize_diagram;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    pub principle: Option<String>,
    pub analogy: Option<String>,
    pub application: Option<String>,
    /// Raw diagram markup as the model produced it. Run it through
    /// [`Lesson::sanitized_diagram`] before rendering.
    pub diagram: Option<String>,
    /// The full reply, kept as the caller's fallback when rendering fails.
    pub raw: String,
}

impl Lesson {
    pub fn parse(text: &str) -> Self {
        let mut principle = None;
        let mut analogy = None;
        let mut application = None;
        let mut diagram_section: Option<String> = None;

        let headings = collect_headings(text);
        for (i, heading) in headings.iter().enumerate() {
            let content_end = headings
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(text.len());
            let content = text[heading.content_start..content_end].trim().to_string();
            let slot = match heading.kind {
                SectionKind::Principle => &mut principle,
                SectionKind::Analogy => &mut analogy,
                SectionKind::Application => &mut application,
                SectionKind::Diagram => &mut diagram_section,
            };
            if slot.is_none() && !content.is_empty() {
                *slot = Some(content);
            }
        }

        let diagram = mermaid_fence_regex()
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .or_else(|| {
                let section = diagram_section.as_deref()?;
                any_fence_regex()
                    .captures(section)
                    .map(|caps| caps[1].trim().to_string())
            })
            .or_else(|| diagram_section.clone())
            .filter(|d| !d.is_empty());

        Self {
            principle,
            analogy,
            application,
            diagram,
            raw: text.to_string(),
        }
    }

    pub fn sanitized_diagram(&self, options: &SanitizeOptions) -> Option<String> {
        self.diagram
            .as_deref()
            .map(|d| sanitize_diagram(d, options))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Principle,
    Analogy,
    Application,
    Diagram,
}

impl SectionKind {
    fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "principle" => Some(Self::Principle),
            "analogy" => Some(Self::Analogy),
            "application" => Some(Self::Application),
            "diagram" => Some(Self::Diagram),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Heading {
    kind: SectionKind,
    start: usize,
    content_start: usize,
}

fn collect_headings(text: &str) -> Vec<Heading> {
    let mut out = Vec::new();
    for caps in heading_regex().captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let Some(kind) = caps.name("kind").and_then(|m| SectionKind::parse(m.as_str())) else {
            continue;
        };

        // Only treat the word as a heading when it is formatted like one:
        // a `#`/`**` prefix, a trailing colon, or the word alone on its line.
        let marked = caps.name("prefix").is_some() || caps.name("colon").is_some();
        let alone = text[whole.end()..]
            .chars()
            .next()
            .is_none_or(|c| c == '\n');
        if !marked && !alone {
            continue;
        }

        out.push(Heading {
            kind,
            start: whole.start(),
            content_start: whole.end(),
        });
    }
    out
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?mi)^\s{0,3}(?P<prefix>#{1,6}\s*|\*\*\s*)?(?P<kind>principle|analogy|application|diagram)\b\**(?P<colon>\s*:)?\**[ \t]*",
        )
        .expect("valid regex")
    })
}

fn mermaid_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```\s*(?:mermaid|mmd)[ \t]*\n(.*?)```").expect("valid regex")
    })
}

fn any_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9]*[ \t]*\n(.*?)```").expect("valid regex"))
}
