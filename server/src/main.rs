mod assets;
mod config;

use axum::{routing::get, routing::IntoMakeService, Router};
use axum_server::tls_rustls::RustlsConfig;
use signet_auth::{auth_routes, AuthService, AuthState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

fn get_make_service(auth_state: AuthState, assets_dir: &str) -> IntoMakeService<Router> {
    let auth_router = auth_routes(auth_state.registry()).with_state(auth_state);

    Router::new()
        .route("/health", get(health_check))
        .merge(assets::asset_routes(assets_dir))
        .merge(auth_router)
        .layer(TraceLayer::new_for_http())
        .into_make_service()
}

fn bind_addr(config: &config::ServerConfig, port: u16) -> SocketAddr {
    let ip_addr = config.host.parse::<std::net::IpAddr>().unwrap_or_else(|e| {
        tracing::warn!("Failed to parse host '{}': {}. Using 0.0.0.0", config.host, e);
        [0, 0, 0, 0].into()
    });
    SocketAddr::from((ip_addr, port))
}

async fn http_server(config: config::ServerConfig, srv: IntoMakeService<Router>) -> std::io::Result<()> {
    let addr = bind_addr(&config, config.http_port);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr).serve(srv).await
}

async fn https_server(config: config::ServerConfig, srv: IntoMakeService<Router>) -> std::io::Result<()> {
    let cert_path = config.ssl_cert_path.as_deref().unwrap_or("server.crt");
    let key_path = config.ssl_key_path.as_deref().unwrap_or("server.key");

    let rustls_config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to load SSL certificates (cert: '{}', key: '{}'): {}",
                cert_path,
                key_path,
                e
            );
            e
        })?;

    let addr = bind_addr(&config, config.https_port);

    tracing::info!("HTTPS server listening on {}", addr);
    axum_server::bind_rustls(addr, rustls_config).serve(srv).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default rustls crypto provider")?;

    let config = config::Config::load()?;

    // RUST_LOG wins over the configured level when set
    let log_level = config.logging.level.to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting Signet Server");
    tracing::info!("Configuration loaded:");
    tracing::info!("  HTTP enabled: {}, port: {}", config.server.enable_http, config.server.http_port);
    tracing::info!("  HTTPS enabled: {}, port: {}", config.server.enable_https, config.server.https_port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Log level: {}", config.logging.level);
    tracing::info!("  Public location: {}", config.auth.location);
    tracing::info!("  Assets: {}", config.assets.dir);

    let template_path = config.assets.template_path();
    let template = tokio::fs::read_to_string(&template_path).await.map_err(|e| {
        tracing::error!("Failed to read page template '{}': {}", template_path, e);
        e
    })?;

    let auth_service = AuthService::new(config.auth.clone(), &template).map_err(|e| {
        tracing::error!("Failed to initialize authentication service: {}", e);
        e
    })?;
    for provider in auth_service.registry() {
        tracing::info!("  Provider: {} -> {}", provider.name(), provider.path());
    }

    let auth_state = AuthState::new(Arc::new(auth_service));
    let srv = get_make_service(auth_state, &config.assets.dir);

    let mut tasks = Vec::new();

    if config.server.enable_http {
        let http_config = config.server.clone();
        let srv = srv.clone();
        tasks.push(tokio::spawn(async move { http_server(http_config, srv).await }));
    } else {
        tracing::info!("HTTP server disabled in configuration");
    }

    if config.server.enable_https {
        let https_config = config.server.clone();
        let srv = srv.clone();
        tasks.push(tokio::spawn(async move { https_server(https_config, srv).await }));
    } else {
        tracing::info!("HTTPS server disabled in configuration");
    }

    if tasks.is_empty() {
        tracing::error!("No servers enabled! Please enable at least one server (HTTP or HTTPS) in the configuration.");
        return Err("No servers enabled".into());
    }

    // Servers only return on error
    for task in tasks {
        task.await??;
    }

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
