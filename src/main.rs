use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use septima_core::{Config, build_pipeline, load_config, resolve_config_path};
use septima_gateway::GatewayServer;
use septima_rag::Answer;
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "septima", version, about = "Sermon chat and semantic search backend")]
struct Cli {
    /// Path to the TOML config (falls back to `SEPTIMA_CONFIG`, then `config/default.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP gateway until Ctrl-C.
    Serve,
    /// Answer a single question without history.
    Ask { query: String },
    /// Semantic sermon search, printed as JSON.
    Search {
        query: String,
        #[arg(long)]
        sermons: Option<usize>,
        #[arg(long)]
        paragraphs: Option<usize>,
    },
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)
        .await
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    match cli.command {
        Command::Serve => serve(&config).await,
        Command::Ask { query } => {
            let pipeline = build_pipeline(&config)?;
            let answer = pipeline.answer(&query, &[]).await?;
            print_answer(&answer);
            Ok(())
        }
        Command::Search {
            query,
            sermons,
            paragraphs,
        } => {
            let pipeline = build_pipeline(&config)?;
            let groups = pipeline.search(&query, paragraphs, sermons).await?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
            Ok(())
        }
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline(config)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(&config.gateway.bind, config.gateway.port, pipeline, shutdown_rx)
        .with_rate_limit(config.gateway.rate_limit)
        .with_max_body_size(config.gateway.max_body_size)
        .serve()
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.response);
    if answer.sources.is_empty() {
        return;
    }
    println!("\nSources:");
    for source in &answer.sources {
        match &source.main_reference {
            Some(reference) => println!("- {} ({reference})", source.title),
            None => println!("- {}", source.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "septima",
            "--config",
            "/tmp/s.toml",
            "search",
            "grace",
            "--sermons",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
        match cli.command {
            Command::Search {
                query,
                sermons,
                paragraphs,
            } => {
                assert_eq!(query, "grace");
                assert_eq!(sermons, Some(3));
                assert!(paragraphs.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
