//! Routing from command tags to handlers, and turning replies into
//! something Telegram can send

use std::sync::Arc;
use tracing::{debug, error};

use crate::completion::CompletionClient;
use crate::config::BotConfig;
use crate::localization::t_args_lang;

use super::commands::CommandTag;
use super::handlers::{self, DocumentReply, Reply};

/// Shared, read-only state handed to every update
pub struct BotContext {
    pub config: BotConfig,
    pub completion: Arc<dyn CompletionClient>,
}

impl BotContext {
    pub fn new(config: BotConfig, completion: Arc<dyn CompletionClient>) -> Self {
        Self { config, completion }
    }
}

/// One classified incoming message
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub tag: CommandTag,
    /// Command argument, or the whole text for [`CommandTag::FreeText`]
    pub input: &'a str,
    pub language_code: Option<&'a str>,
}

/// Run the handler registered for the request's tag
pub async fn dispatch(ctx: &BotContext, request: Request<'_>) -> Reply {
    let knowledge = &ctx.config.knowledge;
    let language_code = request.language_code;

    match request.tag {
        CommandTag::Start => handlers::welcome(language_code),
        CommandTag::Help => handlers::help(language_code),
        CommandTag::ListSubjects => handlers::list_subjects(&knowledge.catalog, language_code),
        CommandTag::GetNotes => {
            handlers::get_notes(&knowledge.catalog, request.input, language_code)
        }
        CommandTag::FreeText => Reply::Text(
            handlers::resolve_query(
                &knowledge.answers,
                ctx.completion.as_ref(),
                &ctx.config.completion,
                request.input,
                language_code,
            )
            .await,
        ),
    }
}

/// A reply with its document bytes loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    Document {
        file_name: String,
        bytes: Vec<u8>,
        caption: String,
    },
}

/// Load the document of a reply; an unreadable file becomes a failure text
pub async fn materialize(reply: Reply, language_code: Option<&str>) -> Outgoing {
    match reply {
        Reply::Text(text) => Outgoing::Text(text),
        Reply::Document(document) => load_document(document, language_code).await,
    }
}

async fn load_document(document: DocumentReply, language_code: Option<&str>) -> Outgoing {
    match tokio::fs::read(&document.path).await {
        Ok(bytes) => {
            debug!(subject = %document.subject, size = bytes.len(), "Study material loaded");
            let file_name = document
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| document.subject.clone());

            Outgoing::Document {
                file_name,
                bytes,
                caption: document.caption,
            }
        }
        Err(e) => {
            error!(
                subject = %document.subject,
                path = %document.path.display(),
                error = %e,
                "Failed to read study material"
            );
            Outgoing::Text(t_args_lang(
                "notes-send-failed",
                &[("subject", document.subject.as_str())],
                language_code,
            ))
        }
    }
}
