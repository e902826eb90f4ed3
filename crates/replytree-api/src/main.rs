//! replytree CLI and REST API entry point.
//!
//! Binary name: `rtree`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CreateResource, DeleteResource, ListResource};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick a filter from the verbosity flags
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,replytree=debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rtree", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (config, DB, services)
    let mut state = AppState::init().await?;

    match cli.command {
        Commands::Create { resource } => match resource {
            CreateResource::Bot {
                name,
                description,
                tree,
            } => {
                cli::bot::create_bot(&state, name, description, tree, cli.json).await?;
            }
        },

        Commands::List { resource } => match resource {
            ListResource::Bots => {
                cli::bot::list_bots(&state, cli.json).await?;
            }
        },

        Commands::Maps => {
            cli::bot::show_maps(&state, cli.json).await?;
        }

        Commands::Show { id } => {
            cli::bot::show_bot(&state, &id, cli.json).await?;
        }

        Commands::Edit {
            id,
            name,
            description,
            tree,
        } => {
            cli::bot::edit_bot(&state, &id, name, description, tree, cli.json).await?;
        }

        Commands::Delete { resource } => match resource {
            DeleteResource::Bot { id, force } => {
                cli::bot::delete_bot(&state, &id, force, cli.json).await?;
            }
        },

        Commands::Export { id, output, format } => {
            cli::bot::export_map(&state, &id, output, format, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            if let Some(host) = host {
                state.config.host = host;
            }
            if let Some(port) = port {
                state.config.port = port;
            }

            let addr = format!("{}:{}", state.config.host, state.config.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} replytree API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }
            tracing::info!(
                %addr,
                base_url = %state.base_url(),
                data_dir = %state.data_dir.display(),
                "serving"
            );

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
