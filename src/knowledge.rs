//! # Knowledge Store Module
//!
//! Read-only tables the handlers answer from: the subject catalog (subject
//! name to study document) and the canned-answer table (known question to
//! fixed answer). Both are built once at startup, either from the built-in
//! defaults or from a JSON knowledge file, and never mutated afterwards.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors raised while building the knowledge store
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid knowledge file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Duplicate {table} entry: '{key}'")]
    DuplicateKey { table: &'static str, key: String },
    #[error("Empty {table} key")]
    EmptyKey { table: &'static str },
    #[error("Empty answer for question '{question}'")]
    EmptyAnswer { question: String },
}

/// Normalize a subject argument the way users type it: words re-joined by a
/// single space, lowercased.
pub fn normalize_subject(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize a free-text question for canned-answer lookup.
///
/// Only case is folded; whitespace and punctuation must match exactly.
pub fn normalize_question(raw: &str) -> String {
    raw.to_lowercase()
}

/// A study subject and the document that backs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub path: PathBuf,
}

/// Subject catalog, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectCatalog {
    subjects: Vec<Subject>,
}

impl SubjectCatalog {
    /// Build a catalog, normalizing names and rejecting duplicates
    pub fn new<I, N, P>(entries: I) -> Result<Self, KnowledgeError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: AsRef<str>,
        P: Into<PathBuf>,
    {
        let mut subjects: Vec<Subject> = Vec::new();

        for (name, path) in entries {
            let name = normalize_subject(name.as_ref());
            if name.is_empty() {
                return Err(KnowledgeError::EmptyKey { table: "subject" });
            }
            if subjects.iter().any(|subject| subject.name == name) {
                return Err(KnowledgeError::DuplicateKey {
                    table: "subject",
                    key: name,
                });
            }
            subjects.push(Subject {
                name,
                path: path.into(),
            });
        }

        Ok(Self { subjects })
    }

    /// Look up a subject by name; the input is normalized first
    pub fn lookup(&self, subject: &str) -> Option<&Subject> {
        let wanted = normalize_subject(subject);
        self.subjects.iter().find(|candidate| candidate.name == wanted)
    }

    /// Subject names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|subject| subject.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Exact-match (case-insensitive) question to answer table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CannedAnswers {
    answers: HashMap<String, String>,
}

impl CannedAnswers {
    pub fn new<I, Q, A>(entries: I) -> Result<Self, KnowledgeError>
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: AsRef<str>,
        A: Into<String>,
    {
        let mut answers = HashMap::new();

        for (question, answer) in entries {
            let question = normalize_question(question.as_ref());
            if question.is_empty() {
                return Err(KnowledgeError::EmptyKey { table: "answer" });
            }
            if answers.contains_key(&question) {
                return Err(KnowledgeError::DuplicateKey {
                    table: "answer",
                    key: question,
                });
            }
            let answer: String = answer.into();
            if answer.trim().is_empty() {
                return Err(KnowledgeError::EmptyAnswer { question });
            }
            answers.insert(question, answer);
        }

        Ok(Self { answers })
    }

    /// Find the canned answer for a raw question, if any
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.answers
            .get(&normalize_question(question))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Built-in study materials
pub const DEFAULT_SUBJECTS: &[(&str, &str)] = &[
    ("thermodynamics", "/path/to/thermodynamics.pdf"),
    ("data_structures", "/path/to/data_structures.pdf"),
    ("algorithms", "/path/to/algorithms.pdf"),
];

/// Built-in canned answers
pub const DEFAULT_ANSWERS: &[(&str, &str)] = &[
    (
        "what is thermodynamics",
        "Thermodynamics is the branch of physics concerned with heat and temperature and their relation to energy and work.",
    ),
    (
        "what is data structures",
        "Data structures are ways of organizing and storing data efficiently for various operations.",
    ),
];

/// Subject catalog and canned answers, shared read-only by every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeStore {
    pub catalog: SubjectCatalog,
    pub answers: CannedAnswers,
}

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    subjects: Vec<SubjectEntry>,
    #[serde(default)]
    answers: Vec<AnswerEntry>,
}

#[derive(Debug, Deserialize)]
struct SubjectEntry {
    name: String,
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AnswerEntry {
    question: String,
    answer: String,
}

impl KnowledgeStore {
    pub fn new(catalog: SubjectCatalog, answers: CannedAnswers) -> Self {
        Self { catalog, answers }
    }

    /// The tables the bot ships with
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Ok(Self {
            catalog: SubjectCatalog::new(DEFAULT_SUBJECTS.iter().copied())?,
            answers: CannedAnswers::new(DEFAULT_ANSWERS.iter().copied())?,
        })
    }

    /// Parse a knowledge document in the JSON file format
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, KnowledgeError> {
        let parse_error = |source| KnowledgeError::Parse {
            path: origin.to_path_buf(),
            source,
        };

        // serde's derive would also accept the struct written as a sequence
        let value: serde_json::Value = serde_json::from_str(json).map_err(parse_error)?;
        if !value.is_object() {
            return Err(parse_error(<serde_json::Error as serde::de::Error>::custom(
                "expected a JSON object with `subjects` and `answers`",
            )));
        }
        let file: KnowledgeFile = serde_json::from_value(value).map_err(parse_error)?;

        let catalog = SubjectCatalog::new(
            file.subjects
                .into_iter()
                .map(|entry| (entry.name, entry.path)),
        )?;
        let answers = CannedAnswers::new(
            file.answers
                .into_iter()
                .map(|entry| (entry.question, entry.answer)),
        )?;

        Ok(Self { catalog, answers })
    }

    /// Load the tables from a JSON knowledge file
    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeError> {
        debug!(path = %path.display(), "Reading knowledge file");
        let json = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_json_str(&json, path)?;
        info!(
            path = %path.display(),
            subjects = store.catalog.len(),
            answers = store.answers.len(),
            "Knowledge file loaded"
        );
        Ok(store)
    }
}
