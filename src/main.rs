//! tickdown - Digital Signage Countdown Service
//!
//! A settings store and drift-free countdown engine shared by an operator
//! settings surface and a signage render surface.

mod config;
mod engine;
mod events;
mod media;
mod render;
mod settings;
mod store;
mod timezones;
mod web;

use config::ServiceConfig;
use events::UpdateBus;
use media::MediaClient;
use render::Renderer;
use store::SettingsStore;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tickdown=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServiceConfig::load();
    tracing::info!("Starting tickdown on port {}...", cfg.http_port);

    // Resolve the settings store scope and hydrate defaults
    let bus = Arc::new(UpdateBus::default());
    let store = Arc::new(SettingsStore::resolve(
        &cfg.device_db,
        &cfg.instance_db,
        bus.clone(),
    ));
    tracing::info!("Settings store bound to {} scope", store.scope());
    store.hydrate_defaults();

    // Start the render-side countdown
    let renderer = Renderer::start(store.clone(), bus.clone());

    // Media lookup collaborator
    let media = Arc::new(MediaClient::new(cfg.media_api.clone()));

    // Start web server
    let server = Server::new(cfg, store, renderer, media, bus);
    server.start().await?;

    Ok(())
}
