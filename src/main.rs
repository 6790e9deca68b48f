use anyhow::{Context, Result};
use std::sync::Arc;
use study_guide_bot::bot::{self, BotContext, Command};
use study_guide_bot::completion::OpenAiCompletionClient;
use study_guide_bot::config::{BotConfig, ENV_API_KEY};
use study_guide_bot::localization::init_localization;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Text logs by default, JSON lines when `LOG_FORMAT=json`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Study Guide Telegram Bot");

    init_localization().context("Failed to load localization resources")?;

    let config = BotConfig::from_env()?;
    if config.openai_api_key.is_none() {
        warn!("{ENV_API_KEY} is not set; questions without a canned answer will get the apology reply");
    }
    info!(
        subjects = config.knowledge.catalog.len(),
        canned_answers = config.knowledge.answers.len(),
        model = %config.completion.model,
        "Configuration loaded"
    );

    let completion = OpenAiCompletionClient::new(&config.completion, config.openai_api_key.clone())
        .context("Failed to build the completion HTTP client")?;

    let bot = Bot::new(config.telegram_token.clone());

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register the bot command menu");
    }

    let ctx = Arc::new(BotContext::new(config, Arc::new(completion)));

    info!("Bot initialized, starting dispatcher");

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(bot::command_handler),
        )
        .branch(dptree::endpoint(bot::text_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
