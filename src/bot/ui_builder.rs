//! UI Builder module for formatting the static bot texts

// Import localization
use crate::localization::t_lang;

// Import knowledge types
use crate::knowledge::SubjectCatalog;

/// Prefix a line with the list marker used in every bot text
fn bullet(text: &str) -> String {
    format!("- {text}")
}

/// Welcome message sent on /start
pub fn format_welcome(language_code: Option<&str>) -> String {
    format!(
        "{}\n{}\n{}\n\n{}",
        t_lang("welcome-intro", language_code),
        bullet(&t_lang("welcome-feature-doubts", language_code)),
        bullet(&t_lang("welcome-feature-materials", language_code)),
        t_lang("welcome-help-hint", language_code)
    )
}

/// Usage instructions sent on /help
pub fn format_help(language_code: Option<&str>) -> String {
    [
        t_lang("help-title", language_code),
        bullet(&t_lang("help-ask", language_code)),
        bullet(&t_lang("help-notes", language_code)),
        bullet(&t_lang("help-subjects", language_code)),
    ]
    .join("\n")
}

/// Format the subject catalog as a bulleted list, in catalog order
pub fn format_subject_list(catalog: &SubjectCatalog, language_code: Option<&str>) -> String {
    let subject_list = catalog
        .names()
        .map(bullet)
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}", t_lang("subjects-title", language_code), subject_list)
}
