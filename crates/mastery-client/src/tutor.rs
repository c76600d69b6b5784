//! Orchestration: user question in, structured lesson out.

use crate::api::{ChatMessage, TutorClient};
use crate::Result;
use mastery_core::{
    ExportFormat, Glossary, GlossaryItem, Lesson, MasteryConfig, SanitizeOptions, Session,
    export_session,
};

/// Instructs the model to answer in the four-section lesson shape the
/// extractor understands.
pub const TUTOR_SYSTEM_PROMPT: &str = "\
You are a patient tutor. Answer every question in four Markdown sections, \
in this order and with these exact headings:

## Principle
The underlying idea, stated plainly.

## Analogy
One concrete analogy a newcomer would recognize.

## Application
How to apply the idea in practice.

## Diagram
A single Mermaid flowchart in a fenced ```mermaid code block that \
illustrates the idea. Keep node labels short.";

const DEFINE_SYSTEM_PROMPT: &str = "\
You are a patient tutor maintaining a student's glossary. Reply with a \
single short paragraph defining the requested term. No headings, no lists, \
no code blocks.";

/// A tutoring conversation: owns the session transcript, the glossary, and
/// the sanitizer options derived from the engine config.
#[derive(Debug)]
pub struct Tutor {
    client: TutorClient,
    options: SanitizeOptions,
    session: Session,
    glossary: Glossary,
}

impl Tutor {
    pub fn new(client: TutorClient, config: &MasteryConfig) -> Self {
        Self {
            client,
            options: SanitizeOptions::from_config(config),
            session: Session::new(),
            glossary: Glossary::new(),
        }
    }

    /// Records the question, asks the model, records the reply, and returns
    /// the extracted lesson with its diagram already sanitized. Rendering the
    /// diagram (and falling back to `lesson.raw` when that fails) stays with
    /// the caller.
    pub async fn ask(&mut self, question: &str) -> Result<Lesson> {
        self.session.push_user(question);

        let messages: Vec<ChatMessage> = self
            .session
            .messages()
            .iter()
            .map(|m| ChatMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect();

        let reply = self
            .client
            .complete(Some(TUTOR_SYSTEM_PROMPT), &messages)
            .await?;
        self.session.push_assistant(&reply);

        let mut lesson = Lesson::parse(&reply);
        lesson.diagram = lesson.sanitized_diagram(&self.options);
        tracing::debug!(
            has_diagram = lesson.diagram.is_some(),
            "lesson extracted"
        );
        Ok(lesson)
    }

    /// Glossary capture: asks the model for a short definition and stores it
    /// under the term. Duplicate terms are rejected before any network call.
    pub async fn define(&mut self, term: &str) -> Result<GlossaryItem> {
        if let Some(existing) = self.glossary.get(term) {
            return Err(mastery_core::Error::DuplicateTerm {
                term: existing.term.clone(),
            }
            .into());
        }

        let prompt = format!("Define the term \"{}\" for a student.", term.trim());
        let reply = self
            .client
            .complete(Some(DEFINE_SYSTEM_PROMPT), &[ChatMessage::user(prompt)])
            .await?;
        let item = self.glossary.add(term, reply.trim())?;
        Ok(item.clone())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn glossary_mut(&mut self) -> &mut Glossary {
        &mut self.glossary
    }

    /// Replaces the glossary wholesale; used when loading one from disk.
    pub fn set_glossary(&mut self, glossary: Glossary) {
        self.glossary = glossary;
    }

    pub fn sanitize_options(&self) -> &SanitizeOptions {
        &self.options
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        Ok(export_session(&self.session, &self.glossary, format)?)
    }
}
