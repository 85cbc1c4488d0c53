//! Call Agent Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use call_agent_config::{load_settings, Settings};
use call_agent_core::TranscriptSink;
use call_agent_engine::{CallHandler, SessionStore, TranscriptWriter};
use call_agent_llm::OpenAiReplyGenerator;
use call_agent_persistence::{MemoryTranscriptStore, ScyllaConfig};
use call_agent_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("CALL_AGENT_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting Call Agent Server v{}", env!("CARGO_PKG_VERSION"));

    // Transcript sink: durable store, or in-memory when running without one
    let sink: Arc<dyn TranscriptSink> = if config.persistence.enabled {
        let scylla_config = ScyllaConfig {
            hosts: config.persistence.hosts.clone(),
            keyspace: config.persistence.keyspace.clone(),
            replication_factor: config.persistence.replication_factor,
        };
        Arc::new(call_agent_persistence::init(scylla_config).await?)
    } else {
        tracing::warn!("Durable persistence disabled; transcripts are kept in memory only");
        Arc::new(MemoryTranscriptStore::new())
    };

    // The writer task outlives individual turns; transcripts scheduled by
    // an aborted turn still land.
    let (transcripts, _writer_task) =
        TranscriptWriter::spawn(sink, config.engine.persist_queue_depth);

    let generator = Arc::new(OpenAiReplyGenerator::new(config.llm.clone()));

    let handler = Arc::new(CallHandler::new(
        Arc::new(SessionStore::new()),
        generator,
        transcripts,
        config.engine.clone(),
    ));

    let state = AppState::new(config.clone(), handler);
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing with console or JSON output
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("call_agent={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.observability.log_json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }
}
