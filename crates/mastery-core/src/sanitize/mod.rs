//! Best-effort repair of malformed Mermaid-style diagram markup.
//!
//! Models return diagrams with broken arrows, missing headers, unquoted
//! labels, and Markdown artifacts. The sanitizer is an ordered pipeline of
//! bounded text passes that turns such input into markup a renderer will
//! accept, preserving node identifiers, labels, and edges wherever possible.
//!
//! `sanitize_diagram` is pure and never fails: the worst case is a
//! best-effort transformation. Catching a downstream render failure and
//! falling back to the raw text is the caller's job.

use crate::config::{MasteryConfig, SanitizeOptions};
use crate::detect::{DetectorRegistry, Direction};
use crate::preprocess::{self, preprocess_diagram};
use regex::Regex;
use std::sync::OnceLock;

pub fn sanitize_diagram(input: &str, options: &SanitizeOptions) -> String {
    // Front-matter problems must not fail the sanitizer; degrade to plain
    // text cleanup and let the header pass deal with what remains.
    let (code, title, frontmatter_config) = match preprocess_diagram(input) {
        Ok(pre) => (pre.code, pre.title, pre.config),
        Err(_) => (
            preprocess::cleanup_text(input),
            None,
            MasteryConfig::empty_object(),
        ),
    };

    // A direction carried in the diagram's own front-matter wins over the
    // caller's default.
    let options = SanitizeOptions {
        default_direction: frontmatter_config
            .get_str("diagram.default_direction")
            .and_then(Direction::parse)
            .unwrap_or(options.default_direction),
    };
    let options = &options;

    let code = apply_line_pass(&code, repair_arrows);
    let code = ensure_header(&code, options);

    // Bracket pairs mean different things outside the flowchart family
    // (sequence notes, gantt tasks, pie rows), so the label passes are gated
    // on the detected type.
    let registry = DetectorRegistry::default_set();
    let code = if matches!(registry.detect_type(&code), Ok("flowchart")) {
        apply_line_pass(&code, |line| repair_line(&repair_edge_labels(line)))
    } else {
        code
    };

    let mut out = match title {
        Some(t) => format!("---\ntitle: \"{}\"\n---\n{}", t.replace('"', "'"), code),
        None => code,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Applies a repair pass line by line. Comment lines (`%%`) pass through
/// untouched.
fn apply_line_pass(code: &str, pass: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        if content.trim_start().starts_with("%%") {
            out.push_str(content);
        } else {
            out.push_str(&pass(content));
        }
        out.push_str(newline);
    }
    out
}

/// Rewrites common arrow typos into well-formed arrows between the same two
/// identifiers.
fn repair_arrows(input: &str) -> String {
    // Head/shaft splits are mended before doubled shafts so that inputs like
    // `A -- -- > B` collapse fully in a single pass.
    let s = unicode_arrow_regex().replace_all(input, "-->");
    let s = dotted_arrow_regex().replace_all(&s, "-.->");
    let s = split_head_regex().replace_all(&s, "-->");
    let s = split_shaft_regex().replace_all(&s, "-->");
    let s = thick_head_regex().replace_all(&s, "==>");
    let s = doubled_shaft_regex().replace_all(&s, "$head");
    let s = doubled_thick_regex().replace_all(&s, "$head");
    s.to_string()
}

/// Moves `--|text|-->`-style labels behind the arrow head and converts double
/// quotes inside `|…|` labels to single quotes.
fn repair_edge_labels(input: &str) -> String {
    let s = misplaced_edge_label_regex().replace_all(input, "-->|$label|");
    let s = pipe_span_regex()
        .replace_all(&s, |caps: &regex::Captures| caps[0].replace('"', "'"));
    s.to_string()
}

/// Canonicalizes the header line, or inserts a default one when the first
/// non-empty, non-comment line is not a recognized diagram header.
fn ensure_header(code: &str, options: &SanitizeOptions) -> String {
    let default_header = format!("flowchart {}", options.default_direction.as_token());

    let lines: Vec<&str> = code.lines().collect();
    let header_idx = lines.iter().position(|l| {
        let t = l.trim();
        !t.is_empty() && !t.starts_with("%%")
    });

    let Some(idx) = header_idx else {
        return if code.trim().is_empty() {
            default_header
        } else {
            format!("{default_header}\n{code}")
        };
    };

    let mut out_lines: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();
    match repaired_header_line(lines[idx], options) {
        Some(repaired) => out_lines[idx] = repaired,
        None => out_lines.insert(idx, default_header),
    }
    out_lines.join("\n")
}

/// `Some(line)` when the line is (or is close enough to) a diagram header;
/// `None` means a header must be inserted above it.
fn repaired_header_line(line: &str, options: &SanitizeOptions) -> Option<String> {
    let caps = header_keyword_regex().captures(line)?;
    let indent = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let keyword = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let rest = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

    match canonical_keyword(keyword) {
        Some(canon @ ("flowchart" | "graph")) => Some(format!(
            "{indent}{}",
            repair_flowchart_header(canon, rest, options)
        )),
        Some(canon) => Some(format!("{indent}{canon}{rest}")),
        None => {
            // `someword TD` is a header with an unsupported keyword: replace
            // it wholesale. Anything else is content, not a header.
            if header_like_regex().is_match(line) {
                Some(format!(
                    "flowchart {}",
                    options.default_direction.as_token()
                ))
            } else {
                None
            }
        }
    }
}

fn repair_flowchart_header(keyword: &str, rest: &str, options: &SanitizeOptions) -> String {
    let default_token = options.default_direction.as_token();
    let rest_trim = rest.trim();
    if rest_trim.is_empty() || rest_trim == ";" {
        return format!("{keyword} {default_token}");
    }

    let split = rest_trim
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest_trim.len());
    let (token, remainder) = rest_trim.split_at(split);

    if let Some(dir) = Direction::parse(&token.to_ascii_uppercase()) {
        format!("{keyword} {}{remainder}", dir.as_token())
    } else if remainder.trim_start_matches(';').trim().is_empty() {
        format!("{keyword} {default_token}")
    } else {
        // Header with inline content but no direction token: repairing it
        // would mean guessing statement boundaries, so leave it be.
        format!("{keyword} {rest_trim}")
    }
}

fn canonical_keyword(word: &str) -> Option<&'static str> {
    match word.to_ascii_lowercase().as_str() {
        "flowchart" => Some("flowchart"),
        "graph" => Some("graph"),
        "sequencediagram" => Some("sequenceDiagram"),
        "classdiagram" => Some("classDiagram"),
        "classdiagram-v2" => Some("classDiagram-v2"),
        "statediagram" => Some("stateDiagram"),
        "statediagram-v2" => Some("stateDiagram-v2"),
        "erdiagram" => Some("erDiagram"),
        "pie" => Some("pie"),
        "gantt" => Some("gantt"),
        "mindmap" => Some("mindmap"),
        "journey" => Some("journey"),
        "timeline" => Some("timeline"),
        _ => None,
    }
}

/// Per-line node-definition repair: identifier normalization and label
/// quoting.
fn repair_line(line: &str) -> String {
    let mut masks: Vec<String> = Vec::new();
    let masked = mask_spans(line, &mut masks);
    let repaired = repair_node_labels(&masked, &masks);
    unmask_spans(&repaired, &masks)
}

/// Replaces quoted strings and `|…|` edge labels with placeholders so the
/// node passes never rewrite inside them.
fn mask_spans(line: &str, store: &mut Vec<String>) -> String {
    let masked = quoted_span_regex()
        .replace_all(line, |caps: &regex::Captures| {
            store.push(caps[0].to_string());
            format!("#mask{}#", store.len() - 1)
        })
        .to_string();
    pipe_span_regex()
        .replace_all(&masked, |caps: &regex::Captures| {
            store.push(caps[0].to_string());
            format!("#mask{}#", store.len() - 1)
        })
        .to_string()
}

fn unmask_spans(text: &str, store: &[String]) -> String {
    // Later masks can contain earlier placeholders (a quote inside an edge
    // label), so restore in reverse insertion order.
    let mut out = text.to_string();
    for (i, span) in store.iter().enumerate().rev() {
        out = out.replace(&format!("#mask{i}#"), span);
    }
    out
}

fn repair_node_labels(line: &str, masks: &[String]) -> String {
    let re = node_open_regex();
    let mut out = String::with_capacity(line.len());
    let mut pos = 0;

    while pos < line.len() {
        let Some(caps) = re.captures(&line[pos..]) else {
            break;
        };
        let whole = caps.get(0).expect("capture 0 always present");
        let open = caps
            .name("open")
            .expect("open group always present")
            .as_str();
        let close = matching_close(open);

        let node_start = pos + whole.start();
        let after_open = pos + whole.end();
        let Some(rel) = line[after_open..].find(close) else {
            out.push_str(&line[pos..after_open]);
            pos = after_open;
            continue;
        };

        let label = &line[after_open..after_open + rel];
        let span_end = after_open + rel + close.len();

        // A "label" spanning an arrow means the close we found belongs to a
        // different node; skip this open and rescan.
        if label.contains("-->") || label.contains("==>") || label.contains("-.->") {
            out.push_str(&line[pos..after_open]);
            pos = after_open;
            continue;
        }

        let id_raw = caps.name("id").expect("id group always present").as_str();
        let id: String = id_raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();

        out.push_str(&line[pos..node_start]);
        match repaired_label(label, masks) {
            Some(quoted) if !id.is_empty() => {
                out.push_str(&id);
                out.push_str(open);
                out.push_str(&quoted);
                out.push_str(close);
            }
            _ => out.push_str(&line[node_start..span_end]),
        }
        pos = span_end;
    }

    out.push_str(&line[pos..]);
    out
}

/// `None` leaves the node definition untouched: empty labels are not guessed
/// at, and already-quoted labels are not double-wrapped.
fn repaired_label(label: &str, masks: &[String]) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = exact_mask_regex().captures(trimmed) {
        let idx: usize = caps[1].parse().ok()?;
        if masks.get(idx).is_some_and(|span| span.starts_with('"')) {
            return None;
        }
    }

    let text = unmask_spans(trimmed, masks);
    let text = htmlize::unescape(&text);
    let text = text.replace('"', "'");
    Some(format!("\"{text}\""))
}

fn matching_close(open: &str) -> &'static str {
    match open {
        "([" => "])",
        "[[" => "]]",
        "[(" => ")]",
        "((" => "))",
        "{{" => "}}",
        "[" => "]",
        "(" => ")",
        _ => "}",
    }
}

fn unicode_arrow_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[—–]{1,2}>").expect("valid regex"))
}

fn doubled_shaft_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:-{2,}\s+)+(?P<head>-{2,}>)").expect("valid regex"))
}

fn doubled_thick_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:={2,}\s+)+(?P<head>={2,}>)").expect("valid regex"))
}

fn dotted_arrow_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-\.\s*-\s*>").expect("valid regex"))
}

fn split_head_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-{2,}[ \t]+>").expect("valid regex"))
}

fn split_shaft_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-[ \t]+->").expect("valid regex"))
}

fn thick_head_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"={2,}[ \t]+>").expect("valid regex"))
}

fn misplaced_edge_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-{2,}\s*\|(?P<label>[^|\n]*)\|\s*(?:-{0,2}>)?").expect("valid regex")
    })
}

fn pipe_span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\|[^|\n]*\|").expect("valid regex"))
}

fn exact_mask_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#mask(\d+)#$").expect("valid regex"))
}

fn quoted_span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"\n]*""#).expect("valid regex"))
}

fn header_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)([A-Za-z][A-Za-z-]*)(.*)$").expect("valid regex"))
}

fn header_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[A-Za-z][A-Za-z-]*\s+(?i:TD|TB|LR|RL|BT)\s*;?\s*$").expect("valid regex")
    })
}

fn node_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?P<id>[A-Za-z0-9_][A-Za-z0-9_.-]*)\s*(?P<open>\(\[|\[\[|\[\(|\(\(|\{\{|\[|\(|\{)",
        )
        .expect("valid regex")
    })
}
