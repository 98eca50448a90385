use std::sync::Arc;

use serenity::http::Http;
use serenity::prelude::GatewayIntents;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk::config::Config;
use newsdesk::discord::{DiscordClient, Handler};
use newsdesk::fetch::MalNewsSource;
use newsdesk::moderation::{ApprovalPipeline, PostingStage, ProcessingGuard};
use newsdesk::scheduler;
use newsdesk::store::DedupStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing .env is fine; production deployments set real variables.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    let source = match MalNewsSource::new() {
        Ok(source) => Arc::new(source),
        Err(e) => {
            tracing::error!(error = %e, "could not build news source");
            std::process::exit(1);
        }
    };

    let chat = Arc::new(DiscordClient::new(Arc::new(Http::new(&config.token))));
    let store = Arc::new(DedupStore::load(config.data_file.clone()));
    let guard = Arc::new(ProcessingGuard::new());
    let posting = Arc::new(PostingStage::new(
        Arc::clone(&chat),
        Arc::clone(&store),
        config.moderation_channel,
    ));
    let approvals = Arc::new(ApprovalPipeline::new(
        Arc::clone(&chat),
        store,
        guard,
        config.approval(),
    ));

    let (ready_tx, ready_rx) = watch::channel(false);
    let shutdown = CancellationToken::new();

    let scheduler_task = tokio::spawn(scheduler::run(
        config.scheduler(),
        Arc::clone(&source),
        Arc::clone(&posting),
        ready_rx,
        shutdown.clone(),
    ));

    let handler = Handler::new(Arc::clone(&chat), posting, approvals, source, ready_tx);
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = match serenity::Client::builder(&config.token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "could not build gateway client");
            std::process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown_for_signal.cancel();
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(e) = client.start().await {
        tracing::error!(error = %e, "gateway client stopped with error");
    }

    shutdown.cancel();
    let _ = scheduler_task.await;
}
