use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use slot_swap::config::SlotSwapConfig;
use slot_swap::SlotSwap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod http;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "slot_swap";

/// SlotSwap Server - time slot swap negotiation with realtime notifications
#[derive(Parser)]
#[command(name = "slotswap-server")]
#[command(about = "SlotSwap Server - time slot swap negotiation with realtime notifications")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("SlotSwap Server starting");

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn module_config(config: &AppConfig) -> Result<SlotSwapConfig> {
    config.module_config::<SlotSwapConfig>(MODULE_NAME)
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let server = &config.server;
    (server.host.as_str(), server.port)
        .to_socket_addrs()
        .with_context(|| format!("invalid bind address '{}:{}'", server.host, server.port))?
        .next()
        .with_context(|| format!("bind address '{}' resolved to nothing", server.host))
}

async fn run_server(config: AppConfig) -> Result<()> {
    let addr = bind_addr(&config)?;
    let module = SlotSwap::new(module_config(&config)?);

    let cancel = CancellationToken::new();
    let sweeper = module.start_background(cancel.clone());
    let router = http::with_middleware(module.router());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = {
        let cancel = cancel.clone();
        let module = module.clone();
        async move {
            tokio::select! {
                res = shutdown::wait_for_shutdown() => {
                    if let Err(e) = res {
                        tracing::warn!(error = %e, "signal handler failed; shutting down");
                    }
                }
                _ = cancel.cancelled() => {}
            }
            tracing::info!("HTTP server shutting down gracefully");
            cancel.cancel();
            // Open SSE bodies would otherwise keep the graceful drain waiting.
            module.shutdown();
        }
    };

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed");

    cancel.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "expiry sweeper task failed");
        }
    }
    tracing::info!("SlotSwap Server stopped");
    served
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    bind_addr(&config)?;
    module_config(&config)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
