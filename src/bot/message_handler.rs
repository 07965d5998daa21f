//! Message Handler module for processing incoming Telegram messages
//!
//! Translates a Telegram [`Message`] into an engine [`InboundEvent`], lets
//! the engine drive the dialogue, then delivers every reply and, when a
//! report was produced, sends the artifact as a document.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, warn};

use crate::engine::{Command, Engine, InboundEvent};
use crate::report::VacancySearch;

use super::ui_builder::{main_keyboard, SEARCH_BUTTON};

/// Map raw message text to an engine command.
///
/// Commands may carry a `@botname` suffix in group chats; anything that is
/// not a known command (or the search button) is dialogue free text.
pub fn parse_command(text: &str) -> Command {
    let trimmed = text.trim();
    if trimmed == SEARCH_BUTTON {
        return Command::Parse(String::new());
    }
    if !trimmed.starts_with('/') {
        return Command::Text(text.to_string());
    }

    let (token, args) = match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest),
        None => (trimmed, ""),
    };
    let command = token.split('@').next().unwrap_or(token);

    match command {
        "/parse" => Command::Parse(args.to_string()),
        "/cancel" => Command::Cancel,
        "/start" => Command::Start,
        "/help" => Command::Help,
        "/status" => Command::Status,
        // Unknown slash commands fall through as free text so a dialogue
        // answer that merely starts with '/' is not swallowed
        _ => Command::Text(text.to_string()),
    }
}

/// Handle one incoming Telegram message
pub async fn message_handler<S: VacancySearch + 'static>(
    bot: Bot,
    msg: Message,
    engine: Arc<Engine<S>>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        // Photos, stickers etc. are outside this bot's scope
        debug!(chat_id = %msg.chat.id, "ignoring non-text message");
        return Ok(());
    };

    let command = parse_command(text);
    let attach_keyboard = matches!(command, Command::Start);
    let event = InboundEvent {
        chat_id: msg.chat.id.0,
        command,
    };

    let outcome = engine.handle_event(event, Utc::now()).await;

    for reply in &outcome.replies {
        let request = bot.send_message(msg.chat.id, &reply.text);
        if attach_keyboard {
            request.reply_markup(main_keyboard()).await?;
        } else {
            request.await?;
        }
    }

    if let Some(path) = outcome.report_path {
        if let Err(e) = bot.send_document(msg.chat.id, InputFile::file(path)).await {
            warn!(chat_id = %msg.chat.id, error = %e, "failed to deliver report document");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_variants() {
        assert_eq!(
            parse_command("/parse кассир; Москва"),
            Command::Parse("кассир; Москва".to_string())
        );
        assert_eq!(parse_command("/parse"), Command::Parse(String::new()));
        assert_eq!(parse_command("/cancel"), Command::Cancel);
        assert_eq!(parse_command("/start"), Command::Start);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/status"), Command::Status);
    }

    #[test]
    fn test_parse_command_strips_bot_mention() {
        assert_eq!(
            parse_command("/parse@hr_assist_bot бариста"),
            Command::Parse("бариста".to_string())
        );
        assert_eq!(parse_command("/cancel@hr_assist_bot"), Command::Cancel);
    }

    #[test]
    fn test_search_button_acts_like_bare_parse() {
        assert_eq!(parse_command(SEARCH_BUTTON), Command::Parse(String::new()));
    }

    #[test]
    fn test_free_text_passes_through_verbatim() {
        assert_eq!(
            parse_command("  Москва  "),
            Command::Text("  Москва  ".to_string())
        );
        assert_eq!(
            parse_command("/unknown"),
            Command::Text("/unknown".to_string())
        );
    }
}
