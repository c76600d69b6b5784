use crate::*;

#[test]
fn messages_are_appended_in_order_with_unique_ids() {
    let mut session = Session::new();
    session.push_user("What is Ohm's law?");
    session.push_assistant("V = IR.");
    assert_eq!(session.len(), 2);
    assert_eq!(session.messages()[0].role, Role::User);
    assert_eq!(session.messages()[1].role, Role::Assistant);
    assert_ne!(session.messages()[0].id, session.messages()[1].id);
}

#[test]
fn roles_serialize_lowercase() {
    let message = Message::user("hi");
    let value = serde_json::to_value(&message).unwrap();
    assert_eq!(value["role"], "user");
    assert!(value.get("attachment").is_none());
}

#[test]
fn attachment_requires_a_parseable_url() {
    let err = Attachment::new("notes", "not a url").unwrap_err();
    assert!(matches!(err, Error::InvalidAttachmentUrl { .. }));

    let attachment = Attachment::new("notes", "https://example.com/notes.pdf").unwrap();
    let message = Message::user("see attached").with_attachment(attachment);
    assert!(message.attachment.is_some());
}

#[test]
fn session_round_trips_through_serde() {
    let mut session = Session::new();
    session.push_user("q");
    session.push_assistant("a");
    let text = serde_json::to_string(&session).unwrap();
    let back: Session = serde_json::from_str(&text).unwrap();
    assert_eq!(session, back);
}
