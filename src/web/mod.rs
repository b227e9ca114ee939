//! Web server module.
//!
//! Exposes both logical surfaces over HTTP: the operator settings API and
//! the signage render API (snapshot plus a WebSocket push stream).

mod handlers;
mod ws;

pub use handlers::*;
pub use ws::*;

use crate::config::ServiceConfig;
use crate::events::UpdateBus;
use crate::media::MediaClient;
use crate::render::Renderer;
use crate::store::SettingsStore;

use axum::{
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Arc<SettingsStore>,
    pub renderer: Arc<Renderer>,
    pub media: Arc<MediaClient>,
    pub bus: Arc<UpdateBus>,
    pub started_at: DateTime<Utc>,
}

/// Web server for tickdown.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(
        config: ServiceConfig,
        store: Arc<SettingsStore>,
        renderer: Arc<Renderer>,
        media: Arc<MediaClient>,
        bus: Arc<UpdateBus>,
    ) -> Self {
        Self {
            state: AppState {
                config,
                store,
                renderer,
                media,
                bus,
                started_at: Utc::now(),
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Settings surface
            .route("/api/settings", get(handlers::handle_get_settings))
            .route("/api/settings/{key}", get(handlers::handle_get_field))
            .route("/api/settings/{key}", put(handlers::handle_put_field))
            .route("/api/timezones", get(handlers::handle_get_timezones))
            // Render surface
            .route("/api/render", get(handlers::handle_get_render))
            .route("/api/render/events", get(ws::handle_events))
            .route("/api/media/{id}", get(handlers::handle_get_media))
            // Service
            .route("/api/status", get(handlers::handle_status))
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
