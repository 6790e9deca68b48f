//! # Study Guide Telegram Bot
//!
//! A Telegram bot that answers student questions from a table of canned
//! answers, falling back to a remote text-completion API, and shares study
//! documents from a subject catalog.

pub mod bot;
pub mod completion;
pub mod completion_errors;
pub mod config;
pub mod knowledge;
pub mod localization;
