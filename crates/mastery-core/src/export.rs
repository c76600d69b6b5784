//! Session export formatting. Pure: file I/O belongs to the caller.

use crate::{Glossary, Result, Session};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ExportFormat {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

pub fn export_session(
    session: &Session,
    glossary: &Glossary,
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(markdown_export(session, glossary)),
        ExportFormat::Json => {
            let doc = serde_json::json!({
                "session": session,
                "glossary": glossary,
            });
            Ok(serde_json::to_string_pretty(&doc)?)
        }
    }
}

fn markdown_export(session: &Session, glossary: &Glossary) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Mastery session {}\n\n", session.id));
    out.push_str(&format!(
        "Started {}.\n",
        session.started_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ));

    for message in session.messages() {
        out.push_str(&format!(
            "\n## {} ({})\n\n",
            message.role,
            message.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
        out.push_str(message.content.trim_end());
        out.push('\n');
        if let Some(attachment) = &message.attachment {
            out.push_str(&format!(
                "\nAttachment: [{}]({})\n",
                attachment.name, attachment.url
            ));
        }
    }

    if !glossary.is_empty() {
        out.push_str("\n## Glossary\n\n");
        for item in glossary.iter() {
            out.push_str(&format!("- **{}**: {}\n", item.term, item.definition));
        }
    }

    out
}
