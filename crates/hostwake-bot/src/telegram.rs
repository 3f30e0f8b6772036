//! Telegram transport: long-polling dispatcher and reply rendering.

use std::future::Future;
use std::sync::Arc;

use hostwake_control::{Conversation, InboundEvent, Menu, OutboundReply};
use hostwake_core::ChatId;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, Message, Update};

/// Telegram rejects messages longer than 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Run the dispatcher until Ctrl-C.
pub async fn run(bot: Bot, engine: Arc<dyn Conversation>) {
    let handler = Update::filter_message().endpoint(
        |bot: Bot, msg: Message, engine: Arc<dyn Conversation>| async move {
            let username = msg.from.as_ref().and_then(|u| u.username.as_deref());
            let Some(event) = to_event(msg.chat.id.0, username, msg.text()) else {
                return respond(());
            };

            let replies = engine.handle(event).await;
            send_replies(&bot, replies).await;
            respond(())
        },
    );

    tracing::info!("Starting Telegram dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Turn a Telegram message into an engine event.
///
/// Messages without text (stickers, photos, joins) produce nothing.
pub fn to_event(chat_id: i64, username: Option<&str>, text: Option<&str>) -> Option<InboundEvent> {
    let text = text?;
    let chat_id = ChatId::new(chat_id);
    Some(match username {
        Some(name) if !name.is_empty() => InboundEvent::new(name, chat_id, text),
        _ => InboundEvent::anonymous(chat_id, text),
    })
}

/// Build a reply keyboard from a menu.
pub fn keyboard(menu: &Menu) -> KeyboardMarkup {
    let rows = menu
        .button_rows()
        .into_iter()
        .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    KeyboardMarkup::new(rows).resize_keyboard()
}

async fn send_replies(bot: &Bot, replies: Vec<OutboundReply>) {
    deliver(replies, |chat_id, text, markup| {
        let bot = bot.clone();
        async move {
            let request = bot.send_message(teloxide::types::ChatId(chat_id.get()), text);
            match markup {
                Some(markup) => request.reply_markup(markup).await.map(|_| ()),
                None => request.await.map(|_| ()),
            }
        }
    })
    .await;
}

/// Send replies in order through `send`, one call per chunk.
///
/// The menu rides on the last chunk of its reply. A failed chunk abandons the
/// rest of that reply only; later replies are still attempted.
async fn deliver<F, Fut, E>(replies: Vec<OutboundReply>, mut send: F)
where
    F: FnMut(ChatId, String, Option<KeyboardMarkup>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    for reply in replies {
        let chunks = split_message(&reply.text, MAX_MESSAGE_CHARS);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.into_iter().enumerate() {
            let markup = reply.menu.as_ref().filter(|_| i == last).map(keyboard);
            if let Err(e) = send(reply.chat_id, chunk, markup).await {
                tracing::warn!(chat_id = %reply.chat_id, error = %e, "Failed to send reply");
                break;
            }
        }
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Splits on line breaks where possible and never inside a character.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let sep = usize::from(!current.is_empty());

        if current_len + sep + line_len <= max_chars {
            if sep == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += sep + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        let mut rest = line;
        while rest.chars().count() > max_chars {
            let cut = rest
                .char_indices()
                .nth(max_chars)
                .map_or(rest.len(), |(idx, _)| idx);
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        current.push_str(rest);
        current_len = rest.chars().count();
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwake_core::Role;

    #[test]
    fn text_messages_become_events() {
        let event = to_event(42, Some("Alice"), Some("/start")).unwrap();
        assert_eq!(event.chat_id, ChatId::new(42));
        assert_eq!(event.caller.as_deref(), Some("Alice"));
        assert_eq!(event.text, "/start");
    }

    #[test]
    fn missing_username_is_anonymous() {
        let event = to_event(7, None, Some("hi")).unwrap();
        assert!(event.caller.is_none());

        let event = to_event(7, Some(""), Some("hi")).unwrap();
        assert!(event.caller.is_none());
    }

    #[test]
    fn non_text_messages_are_ignored() {
        assert!(to_event(7, Some("alice"), None).is_none());
    }

    #[test]
    fn keyboard_mirrors_menu_rows() {
        let markup = keyboard(&Menu::main(Role::Admin));
        assert_eq!(markup.keyboard.len(), 2);
        assert_eq!(markup.keyboard[0][0].text, "💻 PC control");

        let markup = keyboard(&Menu::main(Role::User));
        assert_eq!(markup.keyboard.len(), 1);
        assert_eq!(markup.keyboard[0].len(), 2);
    }

    #[tokio::test]
    async fn failed_send_does_not_drop_later_replies() {
        let chat = ChatId::new(9);
        let replies = vec![
            OutboundReply::text(chat, "first"),
            OutboundReply::with_menu(chat, "second", Menu::admin()),
        ];

        let mut sent = Vec::new();
        deliver(replies, |_, text, markup| {
            let failed = text == "first";
            if !failed {
                sent.push((text, markup.is_some()));
            }
            async move {
                if failed {
                    Err("network down")
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(sent, vec![("second".to_string(), true)]);
    }

    #[test]
    fn split_short() {
        assert_eq!(split_message("Hello", 100), vec!["Hello"]);
        assert_eq!(split_message("", 100), vec![""]);
    }

    #[test]
    fn split_on_lines() {
        let chunks = split_message("Line 1\nLine 2\nLine 3\nLine 4", 15);
        assert_eq!(chunks, vec!["Line 1\nLine 2", "Line 3\nLine 4"]);
    }

    #[test]
    fn split_long_line_on_char_boundaries() {
        let text = "👤".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
        assert_eq!(chunks[2].chars().count(), 5);
        assert_eq!(chunks.concat(), text);
    }
}
