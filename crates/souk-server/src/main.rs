#![forbid(unsafe_code)]

use souk_server::{
    build_router, mailer_from_config, validate_startup_config_contract, AppState, ServerConfig,
};
use souk_store::Store;
use std::sync::atomic::Ordering;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// `SOUK_LOG` wins over `RUST_LOG`; both absent means `info`.
fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_env("SOUK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_json);
    validate_startup_config_contract(&config)?;
    if config.session_secret_generated {
        warn!("no SOUK_SESSION_SECRET set; sessions will not survive a restart");
    }

    let store = Store::open(&config.db_path).map_err(|e| format!("open store: {e}"))?;
    store.init_schema().map_err(|e| format!("init schema: {e}"))?;
    info!(db = %config.db_path.display(), "store ready");

    let mailer = mailer_from_config(&config.mail)?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(store, config, mailer);
    let app = build_router(state.clone());

    // Contract-checked above, so the parse cannot fail here.
    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket
        .set_keepalive(true)
        .map_err(|e| format!("set_keepalive failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("souk-server listening on {bind_addr}");

    let accepting = state.accepting_requests.clone();
    let drain = state.config.shutdown_drain;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            info!("shutdown signal received; draining in-flight requests");
            // readyz flips to 503 first so load balancers stop routing here.
            accepting.store(false, Ordering::Relaxed);
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
