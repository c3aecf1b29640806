use crate::bot::handlers::{handle_callback, handle_message};
use crate::bot::views::bot_commands;
use crate::bot::TelegramGateway;
use crate::config::BotSettings;
use arrbot_core::access::FileAccessPolicy;
use arrbot_core::backend::{BackendRegistry, MediaKind};
use arrbot_core::download::{DownloadClient, QbittorrentClient};
use arrbot_runtime::{DialogRouter, SessionStore, WorkflowContext};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{info, warn};

/// Run the Telegram transport runtime until interrupted.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());

    let backends = init_backends(&settings).await;
    let router = Arc::new(DialogRouter::new(
        WorkflowContext {
            gateway: Arc::new(TelegramGateway::new(bot.clone())),
            backends,
            download: init_download(&settings),
            access: Arc::new(FileAccessPolicy::from_settings(&settings.app)),
            settings: settings.app.clone(),
        },
        SessionStore::default(),
    ));

    if let Err(e) = bot
        .set_my_commands(bot_commands(&settings.app.entrypoints))
        .await
    {
        warn!("Failed to register the command menu: {}", e);
    }

    info!("Bot is running...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_backends(settings: &BotSettings) -> Arc<BackendRegistry> {
    let registry =
        BackendRegistry::from_settings(&settings.app, &settings.telegram.telegram_token);
    info!(
        "Backends initialized ({} Radarr, {} Sonarr).",
        registry.instances(MediaKind::Movie).len(),
        registry.instances(MediaKind::Series).len()
    );

    // Unreachable instances are reported but do not stop the bot.
    for backend in registry.all() {
        let instance = backend.instance();
        match backend.list_root_folders().await {
            Ok(_) => info!(
                "{} instance '{}' is reachable.",
                backend.kind().service_name(),
                instance.label
            ),
            Err(e) => warn!(
                "{} instance '{}' check failed: {}",
                backend.kind().service_name(),
                instance.label,
                e
            ),
        }
    }
    Arc::new(registry)
}

fn init_download(settings: &BotSettings) -> Option<Arc<dyn DownloadClient>> {
    let qbittorrent = &settings.app.qbittorrent;
    if !qbittorrent.enable {
        return None;
    }
    info!("qBittorrent client initialized ({}).", qbittorrent.server.base_url());
    Some(Arc::new(QbittorrentClient::new(
        qbittorrent,
        settings.app.http_timeout(),
    )))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(handle_message),
        )
}
