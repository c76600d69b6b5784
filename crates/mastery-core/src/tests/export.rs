use crate::*;
use std::str::FromStr;

fn sample() -> (Session, Glossary) {
    let mut session = Session::new();
    session.push_user("What is Ohm's law?");
    session.push_assistant("## Principle\nV = IR.");
    let mut glossary = Glossary::new();
    glossary.add("Ohm", "Unit of resistance.").unwrap();
    (session, glossary)
}

#[test]
fn markdown_export_lists_messages_and_glossary() {
    let (session, glossary) = sample();
    let out = export_session(&session, &glossary, ExportFormat::Markdown).unwrap();
    assert!(out.starts_with(&format!("# Mastery session {}", session.id)));
    assert!(out.contains("## user ("));
    assert!(out.contains("What is Ohm's law?"));
    assert!(out.contains("## assistant ("));
    assert!(out.contains("- **Ohm**: Unit of resistance."));
}

#[test]
fn markdown_export_omits_empty_glossary() {
    let (session, _) = sample();
    let out = export_session(&session, &Glossary::new(), ExportFormat::Markdown).unwrap();
    assert!(!out.contains("## Glossary"));
}

#[test]
fn json_export_carries_session_and_glossary() {
    let (session, glossary) = sample();
    let out = export_session(&session, &glossary, ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["session"]["messages"][0]["role"], "user");
    assert_eq!(
        value["glossary"]["ohm"]["definition"],
        "Unit of resistance."
    );
}

#[test]
fn export_format_parses_from_str() {
    assert_eq!(ExportFormat::from_str("md").unwrap(), ExportFormat::Markdown);
    assert_eq!(
        ExportFormat::from_str("Markdown").unwrap(),
        ExportFormat::Markdown
    );
    assert_eq!(ExportFormat::from_str("JSON").unwrap(), ExportFormat::Json);
    assert!(ExportFormat::from_str("pdf").is_err());
}
