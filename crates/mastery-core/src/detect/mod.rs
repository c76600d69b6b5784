use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
#[error("No diagram type detected for text: {text}")]
pub struct DetectTypeError {
    pub text: String,
}

pub type DetectorFn = fn(text: &str) -> bool;

#[derive(Debug, Clone)]
pub struct Detector {
    pub id: &'static str,
    pub detector: DetectorFn,
}

/// Diagram-type detection.
///
/// The sanitizer uses this to decide whether a header line is present and
/// whether the label passes apply; callers use it to validate sanitizer
/// output before handing it to a renderer.
#[derive(Debug, Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Detector>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add(&mut self, detector: Detector) {
        self.detectors.push(detector);
    }

    pub fn add_fn(&mut self, id: &'static str, detector: DetectorFn) {
        self.add(Detector { id, detector });
    }

    /// The diagram kinds a tutoring model actually emits.
    ///
    /// The detector order is significant: keyworded grammars come before the
    /// flowchart catch-all so `stateDiagram` is never claimed by a looser
    /// pattern.
    pub fn default_set() -> Self {
        let mut reg = Self::new();

        reg.add_fn("sequence", detector_sequence);
        reg.add_fn("classDiagram", detector_class);
        reg.add_fn("er", detector_er);
        reg.add_fn("gantt", detector_gantt);
        reg.add_fn("pie", detector_pie);
        reg.add_fn("mindmap", detector_mindmap);
        reg.add_fn("journey", detector_journey);
        reg.add_fn("timeline", detector_timeline);
        reg.add_fn("stateDiagram", detector_state);
        reg.add_fn("flowchart", detector_flowchart);

        reg
    }

    pub fn detect_type(&self, text: &str) -> Result<&'static str> {
        let no_frontmatter = frontmatter_regex().replace(text, "").to_string();
        let cleaned = comment_line_regex()
            .replace_all(&no_frontmatter, "\n")
            .to_string();

        for det in &self.detectors {
            if (det.detector)(&cleaned) {
                return Ok(det.id);
            }
        }

        Err(DetectTypeError { text: cleaned }.into())
    }

    /// Whether a single line is a recognized diagram header.
    pub fn is_header_line(&self, line: &str) -> bool {
        self.detectors.iter().any(|det| (det.detector)(line))
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Flowchart layout direction token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    BottomUp,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "TD" | "TB" => Some(Self::TopDown),
            "BT" => Some(Self::BottomUp),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::TopDown => "TD",
            Self::BottomUp => "BT",
            Self::LeftRight => "LR",
            Self::RightLeft => "RL",
        }
    }
}

fn frontmatter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^-{3}\s*[\n\r](.*?)[\n\r]-{3}\s*[\n\r]+").expect("valid regex")
    })
}

fn comment_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*%%.*\n?").expect("valid regex"))
}

fn detector_sequence(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*sequenceDiagram").expect("valid regex"))
        .is_match(txt)
}

fn detector_class(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*classDiagram(-v2)?").expect("valid regex"))
        .is_match(txt)
}

fn detector_er(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*erDiagram").expect("valid regex"))
        .is_match(txt)
}

fn detector_gantt(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*gantt").expect("valid regex"))
        .is_match(txt)
}

fn detector_pie(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*pie").expect("valid regex"))
        .is_match(txt)
}

fn detector_mindmap(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*mindmap").expect("valid regex"))
        .is_match(txt)
}

fn detector_journey(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*journey").expect("valid regex"))
        .is_match(txt)
}

fn detector_timeline(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*timeline").expect("valid regex"))
        .is_match(txt)
}

fn detector_state(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*stateDiagram(-v2)?").expect("valid regex"))
        .is_match(txt)
}

fn detector_flowchart(txt: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(flowchart|graph)\b").expect("valid regex"))
        .is_match(txt)
}
