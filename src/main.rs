use anyhow::Result;
use chrono::Duration;
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hr_assist::bot;
use hr_assist::config::BotConfig;
use hr_assist::engine::Engine;
use hr_assist::search::HhClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting HR-Assist vacancies bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Get bot token from environment
    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");

    // Remaining settings are read once here; the core gets plain values
    let config = BotConfig::from_env();
    info!(
        report_dir = %config.report_dir.display(),
        dialog_timeout_secs = config.dialog_idle_timeout_secs,
        "configuration loaded"
    );

    let searcher = HhClient::new(config.search.clone())?;
    let engine = Arc::new(Engine::new(
        searcher,
        config.report_dir.clone(),
        Duration::seconds(config.dialog_idle_timeout_secs as i64),
    ));

    // Initialize the bot
    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    // Set up the dispatcher with the shared engine
    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let engine = Arc::clone(&engine);
        move |bot: Bot, msg: Message| {
            let engine = Arc::clone(&engine);
            async move { bot::message_handler(bot, msg, engine).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
