// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::database_ops::games::GameStore;
use crate::orchestrator::IngestionOrchestrator;
use crate::util::env::env_opt;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;

pub const DEFAULT_PORT: u16 = 3000;

/// Shared handler state.
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub populator: IngestionOrchestrator,
}

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match env_opt("API_PORT") {
            Some(p) => p.parse().with_context(|| format!("Invalid API_PORT '{p}'"))?,
            None => DEFAULT_PORT,
        };
        let allowed_origins =
            env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            host,
            port,
            allowed_origins,
        })
    }

    /// Start the HTTP server
    pub async fn run(self, state: AppState) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            "Starting top-games API server"
        );

        let state = web::Data::new(state);
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
