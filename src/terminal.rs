//! Line-oriented terminal front-end
//!
//! Plain lines are submitted as text; lines starting with `/` are commands.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::lifecycle::ChatError;
use crate::message::{Message, Role};
use crate::session::{ChatSession, EventOutcome, PresentationEvent};

pub const HELP: &str = "\
commands:
  /record          start recording
  /stop            stop recording and send the clip
  /lang <name>     choose the target language
  /role <name>     speak as Doctor or Patient
  /summary         summarize the persisted conversation
  /clear           delete the persisted history
  /help            show this help
  /quit            leave
anything else is sent as a message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Event(PresentationEvent),
    Help,
    Quit,
    Invalid(String),
}

/// Interpret one input line; blank lines yield nothing
pub fn parse_line(line: &str) -> Option<ChatCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(ChatCommand::Event(PresentationEvent::SubmitText(line.to_string())));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let parsed = match (name, arg) {
        ("record", _) => ChatCommand::Event(PresentationEvent::StartRecording),
        ("stop", _) => ChatCommand::Event(PresentationEvent::StopRecording),
        ("summary", _) => ChatCommand::Event(PresentationEvent::RequestSummary),
        ("clear", _) => ChatCommand::Event(PresentationEvent::ClearHistory),
        ("lang", "") | ("role", "") => ChatCommand::Invalid(format!("/{} needs an argument", name)),
        ("lang", language) => {
            ChatCommand::Event(PresentationEvent::SelectLanguage(language.to_string()))
        }
        ("role", role) => match role.parse::<Role>() {
            Ok(role) => ChatCommand::Event(PresentationEvent::SelectRole(role)),
            Err(e) => ChatCommand::Invalid(e),
        },
        ("help", _) => ChatCommand::Help,
        ("quit", _) | ("exit", _) => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command /{}", name)),
    };

    Some(parsed)
}

/// Render the message list the way the chat box shows it
pub fn render_messages(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "(no messages)".to_string();
    }

    messages
        .iter()
        .map(|m| {
            format!(
                "[{}] {}\n    Original:   {}\n    Translated: {}",
                m.timestamp.format("%H:%M:%S"),
                m.role,
                m.text,
                m.translation_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the terminal client until stdin closes or `/quit`
pub async fn run(session: Arc<ChatSession>) -> Result<()> {
    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let rendered = render_messages(&updates.borrow_and_update());
            println!("\n{}\n", rendered);
        }
    });

    session.hydrate().await;

    let selection = session.selection();
    println!(
        "Speaking as {} into {}. Type /help for commands.",
        selection.role, selection.language
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let event = match parse_line(&line) {
            None => continue,
            Some(ChatCommand::Quit) => break,
            Some(ChatCommand::Help) => {
                println!("{}", HELP);
                continue;
            }
            Some(ChatCommand::Invalid(reason)) => {
                println!("{}", reason);
                continue;
            }
            Some(ChatCommand::Event(event)) => event,
        };

        // Sends run in the background so several can be in flight
        if let PresentationEvent::SubmitText(_) = event {
            let session = Arc::clone(&session);
            tokio::spawn(async move { report(session.handle(event).await) });
        } else {
            report(session.handle(event).await);
        }
    }

    printer.abort();
    Ok(())
}

fn report(result: Result<EventOutcome, ChatError>) {
    match result {
        Ok(EventOutcome::Summary { summary }) => println!("Summary:\n{}", summary),
        Ok(EventOutcome::LanguageSelected { language }) => println!("Translating into {}", language),
        Ok(EventOutcome::RoleSelected { role }) => println!("Speaking as {}", role),
        Ok(EventOutcome::RecordingStarted) => println!("Recording... (/stop to send)"),
        Ok(EventOutcome::HistoryCleared) => println!("History cleared"),
        Ok(other) => debug!("{:?}", other),
        Err(ChatError::EmptyInput) => {}
        Err(e) => {
            warn!("{}", e);
            println!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageStatus, AUDIO_PLACEHOLDER_TEXT};

    #[test]
    fn test_plain_text_is_submitted() {
        assert_eq!(
            parse_line("  Hello there "),
            Some(ChatCommand::Event(PresentationEvent::SubmitText(
                "Hello there".to_string()
            )))
        );
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_line("/record"),
            Some(ChatCommand::Event(PresentationEvent::StartRecording))
        );
        assert_eq!(
            parse_line("/lang Tamil"),
            Some(ChatCommand::Event(PresentationEvent::SelectLanguage(
                "Tamil".to_string()
            )))
        );
        assert_eq!(
            parse_line("/role patient"),
            Some(ChatCommand::Event(PresentationEvent::SelectRole(Role::Patient)))
        );
        assert_eq!(parse_line("/quit"), Some(ChatCommand::Quit));
    }

    #[test]
    fn test_bad_commands_are_reported() {
        assert!(matches!(parse_line("/lang"), Some(ChatCommand::Invalid(_))));
        assert!(matches!(parse_line("/role nurse"), Some(ChatCommand::Invalid(_))));
        assert!(matches!(parse_line("/dance"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn test_render_uses_status_labels() {
        let text = Message::pending_text(Role::Doctor, "Hello");
        let audio = Message::pending_audio(Role::Patient).failed();
        assert_eq!(audio.status, MessageStatus::Error);

        let rendered = render_messages(&[text, audio]);
        assert!(rendered.contains("Doctor"));
        assert!(rendered.contains("Translating..."));
        assert!(rendered.contains(AUDIO_PLACEHOLDER_TEXT));
        assert!(rendered.contains("Error sending audio"));
    }
}
