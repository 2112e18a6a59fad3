mod api;
mod commands;
mod gateway;
mod markers;
mod reply;

use aide_channels::TwilioChannel;
use aide_core::{
    config::{shellexpand, Config, Prompts},
    message::IncomingMessage,
    traits::Provider,
};
use aide_memory::Store;
use aide_providers::OpenAiProvider;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "aide",
    version,
    about = "WhatsApp personal assistant for notes and reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Environment file loaded before reading configuration.
    #[arg(long, env = "AIDE_ENV_FILE", default_value = ".env")]
    env_file: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WhatsApp webhook server.
    Serve,
    /// Run the reminder dispatcher loop.
    Dispatch,
    /// Run one message through the pipeline and print the reply.
    Ask {
        /// Sender address the message is attributed to.
        #[arg(long, default_value = "whatsapp:local")]
        from: String,
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show configuration and check store and provider reachability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match dotenvy::from_path(&cli.env_file) {
        Ok(()) => {}
        Err(e) if e.not_found() => {}
        Err(e) => anyhow::bail!("failed to load {}: {e}", cli.env_file),
    }

    let cfg = Config::from_env()?;
    let _log_guard = init_logging(cfg.log_dir.as_deref())?;

    match cli.command {
        Commands::Serve => {
            cfg.require_provider()?;
            let gateway = Arc::new(build_gateway(&cfg).await?);
            info!(
                "aide serving | model: {} | db: {}",
                cfg.provider.model, cfg.memory.db_url
            );
            api::serve(&cfg.api, gateway, shutdown_signal()).await?;
        }
        Commands::Dispatch => {
            cfg.require_channel()?;
            let store = Store::new(&cfg.memory).await?;
            let channel = Arc::new(TwilioChannel::new(cfg.channel.clone()));
            let dispatcher = gateway::Dispatcher::new(store, channel, &cfg.scheduler);
            dispatcher.run(shutdown_signal()).await;
        }
        Commands::Ask { from, message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: aide ask <message>");
            }
            cfg.require_provider()?;
            let gateway = build_gateway(&cfg).await?;
            let incoming = IncomingMessage::whatsapp(&from, &message.join(" "));
            let now = chrono::Local::now().naive_local();
            let reply = gateway.handle_message(&incoming, now).await;
            println!("{reply}");
        }
        Commands::Status => status(&cfg).await,
    }

    Ok(())
}

/// Store, oracle, and prompts wired into one pipeline.
async fn build_gateway(cfg: &Config) -> anyhow::Result<gateway::Gateway> {
    let store = Store::new(&cfg.memory).await?;
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(&cfg.provider)?);
    if !provider.is_available().await {
        warn!(
            "provider '{}' did not answer the availability check; continuing",
            provider.name()
        );
    }
    Ok(gateway::Gateway::new(
        provider,
        store,
        Prompts::default(),
        Duration::from_secs(cfg.provider.timeout_secs),
    ))
}

async fn status(cfg: &Config) {
    println!("aide status\n");
    println!("  database:   {}", cfg.memory.db_url);
    println!("  model:      {} @ {}", cfg.provider.model, cfg.provider.base_url);
    println!("  webhook:    http://{}:{}/whatsapp_webhook", cfg.api.host, cfg.api.port);
    println!(
        "  dispatcher: every {}s, {} match",
        cfg.scheduler.poll_interval_secs,
        cfg.scheduler.delivery_match.as_str()
    );
    println!();

    let store = match Store::new(&cfg.memory).await {
        Ok(store) => store.ping().await.map(|_| "ok".to_string()),
        Err(e) => Err(e),
    };
    println!(
        "  store:      {}",
        store.unwrap_or_else(|e| format!("unreachable ({e})"))
    );

    let provider = if cfg.require_provider().is_err() {
        "missing OPENAI_API_KEY".to_string()
    } else {
        match OpenAiProvider::from_config(&cfg.provider) {
            Ok(p) => {
                if p.is_available().await {
                    "available".to_string()
                } else {
                    "not reachable".to_string()
                }
            }
            Err(e) => format!("misconfigured ({e})"),
        }
    };
    println!("  provider:   {provider}");

    println!(
        "  twilio:     {}",
        if cfg.require_channel().is_ok() {
            "configured"
        } else {
            "missing TWILIO_SID / TWILIO_TOKEN"
        }
    );
}

/// Console logging, plus a daily rolling file when `log_dir` is set.
///
/// The returned guard must live until exit so buffered file output is flushed.
fn init_logging(log_dir: Option<&str>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(dir) = log_dir else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let dir = shellexpand(dir);
    std::fs::create_dir_all(&dir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        &dir, "aide.log",
    ));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok(Some(guard))
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
