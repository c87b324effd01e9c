use std::{env, net::SocketAddr, path::Path};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{ServerAuthConfig, ServerState};
use crate::routes;
use service::{runtime, storage::engine::Engine};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Resolve the persisted snapshot path from configs or env vars
fn load_data_file() -> anyhow::Result<String> {
    match configs::load_default() {
        Ok(mut cfg) => {
            cfg.storage.normalize_from_env();
            cfg.storage.validate()?;
            Ok(cfg.storage.data_file)
        }
        Err(_) => Ok(env::var("KVSTASH_DATA_FILE")
            .unwrap_or_else(|_| "data/kvstash.json".to_string())),
    }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let data_file = load_data_file()?;
    let data_dir = Path::new(&data_file)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());
    runtime::ensure_env(&data_dir).await?;

    // Storage engine: one instance shared by every handler
    let engine = Engine::open(&data_file).await;

    // Shared-secret token guarding the store routes
    let auth_token =
        env::var("AUTH_TOKEN").unwrap_or_else(|_| "dev-token-change-me".to_string());
    let state = ServerState {
        engine,
        auth: ServerAuthConfig { auth_token },
    };

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(state, cors);

    // Bind and serve
    let addr = load_bind_addr()?;
    info!(%addr, %data_file, "starting kvstash server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
