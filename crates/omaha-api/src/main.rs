//! Omaha relay server and CLI clients.
//!
//! Binary name: `omaha`
//!
//! Parses CLI arguments, initializes tracing, then either starts the HTTP
//! relay (`serve`) or runs one of the clients against a running relay
//! (`ask`, `chat`).

mod cli;
mod http;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use omaha_infra::config::load_server_config;
use omaha_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need logging
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "omaha", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(verbosity_filter(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve { port, host, config } => {
            let mut server_config = load_server_config(&config).await;
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            serve(AppState::init(server_config)).await
        }

        Commands::Ask { question, url } => cli::ask::ask_once(&url, &question.join(" ")).await,

        Commands::Chat { url } => cli::chat::run_chat_loop(&url).await,

        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                state.config.host, state.config.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        persona = %state.config.persona_path,
        model = %state.config.generation.model,
        upstream = state.provider.is_some(),
        "Relay listening"
    );
    println!(
        "  {} Omaha relay listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}/ask")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
