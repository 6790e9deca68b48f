//! Request handlers
//!
//! Every handler maps its input and the read-only configuration to a
//! [`Reply`]. None of them talks to Telegram: document bytes are read when
//! the reply is materialized, and the only outbound call is the completion
//! fallback in [`resolve_query`].

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::completion::CompletionClient;
use crate::completion_errors::CompletionError;
use crate::config::{build_prompt, CompletionSettings};
use crate::knowledge::{normalize_subject, CannedAnswers, SubjectCatalog};
use crate::localization::{t_args_lang, t_lang};

use super::ui_builder::{format_help, format_subject_list, format_welcome};

/// A study document to attach to the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReply {
    pub subject: String,
    pub path: PathBuf,
    pub caption: String,
}

/// What a handler wants sent back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Document(DocumentReply),
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text.as_str()),
            Reply::Document(_) => None,
        }
    }
}

pub fn welcome(language_code: Option<&str>) -> Reply {
    Reply::Text(format_welcome(language_code))
}

pub fn help(language_code: Option<&str>) -> Reply {
    Reply::Text(format_help(language_code))
}

pub fn list_subjects(catalog: &SubjectCatalog, language_code: Option<&str>) -> Reply {
    Reply::Text(format_subject_list(catalog, language_code))
}

/// Resolve `/get_notes <subject...>` against the catalog
pub fn get_notes(catalog: &SubjectCatalog, argument: &str, language_code: Option<&str>) -> Reply {
    let subject = normalize_subject(argument);
    if subject.is_empty() {
        debug!("get_notes called without a subject");
        return Reply::Text(t_lang("notes-usage", language_code));
    }

    match catalog.lookup(&subject) {
        Some(entry) => {
            info!(subject = %entry.name, path = %entry.path.display(), "Serving study material");
            Reply::Document(DocumentReply {
                subject: entry.name.clone(),
                path: entry.path.clone(),
                caption: t_args_lang("notes-caption", &[("subject", entry.name.as_str())], language_code),
            })
        }
        None => {
            debug!(subject = %subject, "Unknown subject requested");
            Reply::Text(t_args_lang(
                "notes-unknown-subject",
                &[("subject", subject.as_str())],
                language_code,
            ))
        }
    }
}

/// Answer a free-text question: canned answer first, then one completion call.
///
/// Never fails; completion errors are logged and replaced by the apology text.
pub async fn resolve_query(
    answers: &CannedAnswers,
    completion: &dyn CompletionClient,
    settings: &CompletionSettings,
    query: &str,
    language_code: Option<&str>,
) -> String {
    if let Some(answer) = answers.lookup(query) {
        debug!("Answered from canned responses");
        return answer.to_string();
    }

    let prompt = build_prompt(query);
    match completion.complete(&prompt, settings.max_tokens).await {
        Ok(answer) => {
            info!(answer_length = answer.len(), "Answered by completion fallback");
            answer
        }
        Err(e) => {
            match &e {
                CompletionError::Network(_) | CompletionError::MalformedResponse(_) => {
                    warn!(kind = e.kind(), error = %e, "Completion fallback failed");
                }
                CompletionError::Auth(_)
                | CompletionError::Quota(_)
                | CompletionError::Rejected { .. } => {
                    error!(kind = e.kind(), error = %e, "Completion fallback failed");
                }
            }
            t_lang("query-apology", language_code)
        }
    }
}
