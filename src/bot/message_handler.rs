//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::debug;

use super::commands::{is_free_text, Command, CommandTag};
use super::dispatch::{dispatch, materialize, BotContext, Outgoing, Request};
use super::handlers::Reply;

/// Telegram language code of the message sender
fn sender_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

/// Endpoint for recognized bot commands
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> Result<()> {
    let language_code = sender_language(&msg);
    debug!(user_id = %msg.chat.id, command = ?cmd.tag(), "Received command from user");

    let request = Request {
        tag: cmd.tag(),
        input: cmd.argument(),
        language_code,
    };
    let reply = dispatch(&ctx, request).await;
    send_reply(&bot, msg.chat.id, reply, language_code).await
}

/// Endpoint for every other text message
pub async fn text_handler(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if !is_free_text(text) {
        debug!(user_id = %msg.chat.id, "Ignoring unknown command");
        return Ok(());
    }

    let language_code = sender_language(&msg);
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received question from user");

    let request = Request {
        tag: CommandTag::FreeText,
        input: text,
        language_code,
    };
    let reply = dispatch(&ctx, request).await;
    send_reply(&bot, msg.chat.id, reply, language_code).await
}

/// Send a handler reply, attaching the study document when there is one
pub async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    reply: Reply,
    language_code: Option<&str>,
) -> Result<()> {
    match materialize(reply, language_code).await {
        Outgoing::Text(text) => {
            bot.send_message(chat_id, text).await?;
        }
        Outgoing::Document {
            file_name,
            bytes,
            caption,
        } => {
            bot.send_document(chat_id, InputFile::memory(bytes).file_name(file_name))
                .caption(caption)
                .await?;
            debug!(user_id = %chat_id, "Study material sent");
        }
    }
    Ok(())
}
