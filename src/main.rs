//! ColliCasa bot - Telegram front end for building access control

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use collicasa_bot::{
    bot::Dispatcher,
    config::Args,
    gateway::BackendGateway,
    logging,
    session::SessionStore,
    telegram::{Poller, TelegramClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let gateway_config = args.gateway_config()?;

    info!("======================================");
    info!("  ColliCasa Access Control Bot");
    info!(
        "  build {} ({})",
        env!("GIT_COMMIT_SHORT"),
        env!("BUILD_TIMESTAMP")
    );
    info!("======================================");
    info!("Backend API: {}", gateway_config.base_url);
    info!("Tenant ID: {}", gateway_config.tenant_id);
    info!("Request timeout: {}s", args.request_timeout_secs);
    info!("Session TTL: {}s", args.session_ttl_secs);
    info!("======================================");

    let sessions = Arc::new(SessionStore::new());
    let gateway = Arc::new(BackendGateway::new(gateway_config, Arc::clone(&sessions))?);

    if gateway.health_check().await {
        info!("✓ Backend API connection successful");
    } else {
        warn!("⚠ Backend API health check failed, continuing anyway");
    }

    let telegram = Arc::new(TelegramClient::new(
        &args.telegram_api_url,
        args.bot_token()?,
        args.poll_timeout(),
    )?);

    match telegram.get_me().await {
        Ok(me) => info!(
            "Connected to Telegram as @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        ),
        Err(e) => {
            error!("Telegram bot token rejected: {}", e);
            std::process::exit(1);
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&gateway), args.session_ttl()));
    let poller = Poller::new(telegram, dispatcher, args.poll_timeout());

    info!("Bot is running, press Ctrl+C to stop");
    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        })
        .await;

    let stats = sessions.stats();
    info!(
        sessions = sessions.len(),
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "Bot stopped"
    );

    Ok(())
}
