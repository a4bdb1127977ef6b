mod classifier;
mod claude;
mod config;
mod relay;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use classifier::KeywordDetector;
use claude::Client as ClaudeClient;
use config::Config;
use relay::audit::AuditSink;
use relay::provider::CompletionBackend;
use relay::{
    CompletionProvider, EngineSettings, GeminiClient, InboundMessage, ReplyEngine,
    TelegramAuditSink, TelegramClient, ThreadRngSource,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    /// Wake the bot up.
    Start,
    /// Ask a direct question.
    Ask(String),
}

struct BotState {
    engine: Arc<ReplyEngine>,
    bot_user_id: i64,
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gupshup.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gupshup.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting gupshup...");
    info!("Loaded config from {config_path}");

    let bot = Bot::new(&config.telegram_bot_token);

    // Needed to recognize replies to the bot's own messages.
    let bot_user_id = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id, me.username());
            me.id.0 as i64
        }
        Err(e) => {
            warn!("Failed to get bot info: {e}");
            0
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, abandoning in-flight replies");
            let _ = shutdown_tx.send(true);
        }
    });

    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    let primary: Arc<dyn CompletionBackend> =
        Arc::new(ClaudeClient::new(config.anthropic_api_key.clone()));
    let fallback = config
        .gemini_api_key
        .clone()
        .map(|key| Arc::new(GeminiClient::new(key)) as Arc<dyn CompletionBackend>);
    if fallback.is_some() {
        info!("Gemini fallback provider enabled");
    }
    let provider = CompletionProvider::new(primary, fallback);

    let audit = config.log_chat_id.map(|chat_id| {
        info!("Audit channel: {chat_id}");
        Arc::new(TelegramAuditSink::new(telegram.clone(), chat_id)) as Arc<dyn AuditSink>
    });

    let settings = EngineSettings {
        response_probability: config.response_probability,
        reply_delay_min: config.reply_delay_min,
        reply_delay_max: config.reply_delay_max,
        max_reply_tokens: config.max_reply_tokens,
        technical_max_tokens: config.technical_max_tokens,
    };

    let engine = Arc::new(ReplyEngine::new(
        settings,
        provider,
        telegram.clone(),
        audit,
        Arc::new(KeywordDetector::new()),
        Arc::new(ThreadRngSource),
        shutdown_rx,
    ));

    let state = Arc::new(BotState { engine, bot_user_id });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            info!("Responding to /start command");
            bot.send_message(msg.chat.id, "Main active hoon! Ab maza aayega. 😎")
                .await?;
        }
        Command::Ask(question) => {
            info!("Received /ask command");
            let question = question.trim().to_string();
            if question.is_empty() {
                bot.send_message(msg.chat.id, "Kuch to pucho yaar! /ask ke baad apna sawal likho.")
                    .await?;
                return Ok(());
            }

            let sender_name = msg
                .from
                .as_ref()
                .map(|u| u.first_name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let chat_id = msg.chat.id.0;

            let engine = state.engine.clone();
            tokio::spawn(async move {
                if let Err(e) = engine.answer_direct(chat_id, &sender_name, &question).await {
                    warn!("Failed to answer /ask: {e}");
                }
            });
        }
    }

    Ok(())
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(inbound) = telegram_to_inbound(&msg, state.bot_user_id) else {
        return Ok(());
    };

    // Unrecognized slash commands never reach the engine.
    if inbound.text.starts_with('/') {
        return Ok(());
    }

    state.engine.spawn_handle(inbound);
    Ok(())
}

/// Normalize a Telegram message into the relay's value type.
///
/// Returns None for messages without text (stickers, photos, joins).
fn telegram_to_inbound(msg: &Message, bot_user_id: i64) -> Option<InboundMessage> {
    let text = msg.text()?.to_string();

    let user = msg.from.as_ref();
    let sender_id = user.map(|u| u.id.0 as i64).unwrap_or(0);
    let sender_name = user
        .map(|u| u.first_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let chat_kind = if msg.chat.is_private() {
        "private"
    } else if msg.chat.is_supergroup() {
        "supergroup"
    } else if msg.chat.is_channel() {
        "channel"
    } else {
        "group"
    }
    .to_string();

    let is_reply_to_bot = msg
        .reply_to_message()
        .and_then(|reply| reply.from.as_ref())
        .map(|u| u.id.0 as i64 == bot_user_id)
        .unwrap_or(false);

    Some(InboundMessage {
        sender_id,
        sender_name,
        text,
        chat_id: msg.chat.id.0,
        chat_kind,
        timestamp: msg.date.format("%Y-%m-%d %H:%M").to_string(),
        is_reply_to_bot,
    })
}
