//! Pulsewatch CLI
//!
//! Command-line host for the dashboard synchronization core:
//! - Run a live session and print render instructions as they change
//! - Take a one-shot snapshot of every topic
//! - Query articles and server status directly

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use pulsewatch::clock::{Clock, SystemClock};
use pulsewatch::config::{generate_default_config, Config, LoggingConfig};
use pulsewatch::dashboard::{Dashboard, StatusNotice, StatusSink};
use pulsewatch::projector::{RenderInstruction, Renderer, ViewProjector};
use pulsewatch::push::WsPushTransport;
use pulsewatch::reconcile::Reconciler;
use pulsewatch::{DashboardApiClient, Topic};

#[derive(Parser)]
#[command(name = "pulsewatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live social-media monitoring dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a live dashboard session until Ctrl-C
    Watch {
        /// Poll only; don't connect to the push channel
        #[arg(long)]
        no_push: bool,
        /// Print full render instructions as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Poll once and print render instructions as JSON
    Snapshot {
        /// Restrict to one topic (stats, sentiment, keywords, trend, articles, ...)
        #[arg(short, long)]
        topic: Option<Topic>,
    },

    /// List recent articles
    Articles {
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only articles in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show one article with its comments
    Article {
        id: String,
    },

    /// Show the server's collection status
    Status,

    /// Generate default config file
    InitConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { output } = &cli.command {
        let template = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, template)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Wrote default config to {}", path.display());
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    config.validate()?;

    init_tracing(&config.logging)?;
    tracing::debug!(api = %config.api.base_url, "Configuration loaded");

    let api = Arc::new(DashboardApiClient::new(config.api_client_config())?);

    match cli.command {
        Commands::Watch { no_push, json } => watch(&config, api, !no_push, json).await?,

        Commands::Snapshot { topic } => {
            let topics = match topic {
                Some(topic) => vec![topic],
                None => Topic::ALL.to_vec(),
            };
            snapshot(&config, &api, &topics).await?;
        }

        Commands::Articles { limit, category } => {
            let articles = api.recent_articles(limit, category.as_deref()).await?;
            if articles.is_empty() {
                println!("No articles");
            }
            for article in articles {
                println!(
                    "{:<20} {:<20} {:>6} {:>6} {:>6}  {}",
                    article.id,
                    article.created_at,
                    article.reposts_count,
                    article.comments_count,
                    article.attitudes_count,
                    article.title
                );
            }
        }

        Commands::Article { id } => {
            let detail = api.article_detail(&id).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }

        Commands::Status => {
            let status = api.system_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("pulsewatch={}", logging.level)))
        .context("invalid log level")?;

    let writer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if logging.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(logging.file.is_none())
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
    Ok(())
}

/// Prints render instructions to stdout
struct TerminalRenderer {
    json: bool,
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, topic: Topic, instruction: &RenderInstruction) {
        if self.json {
            match serde_json::to_string(&serde_json::json!({ "topic": topic, "render": instruction })) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!(topic = %topic, error = %e, "Failed to serialize instruction"),
            }
        } else {
            println!(
                "{} {:<12} {}",
                chrono::Local::now().format("%H:%M:%S"),
                topic,
                instruction.summary()
            );
        }
    }
}

/// Prints status notices to stderr
struct TerminalStatus;

impl StatusSink for TerminalStatus {
    fn show(&mut self, notice: &StatusNotice) {
        eprintln!("[{}] {}", notice.severity, notice.message);
    }

    fn dismiss(&mut self) {}
}

async fn watch(
    config: &Config,
    api: Arc<DashboardApiClient>,
    push: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut dashboard = Dashboard::new(config.dashboard_config(), Arc::new(SystemClock));
    for topic in Topic::ALL {
        dashboard.register_renderer(topic, Box::new(TerminalRenderer { json }));
    }
    dashboard.set_status_sink(Box::new(TerminalStatus));

    tracing::info!(
        session = %dashboard.session_id(),
        api = %config.api.base_url,
        "Starting dashboard session"
    );
    let handle = dashboard.launch(api);

    let cancel = CancellationToken::new();
    let transport = if push && config.push.enabled {
        let transport = WsPushTransport::new(config.push_transport_config());
        Some(transport.spawn(handle.sender(), cancel.clone()))
    } else {
        tracing::info!("Push channel disabled, polling only");
        None
    };

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    cancel.cancel();
    if let Some(transport) = transport {
        match transport.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Push transport ended with error"),
            Err(e) => tracing::warn!(error = %e, "Push transport task failed"),
        }
    }

    let dashboard = handle.teardown().await?;
    tracing::info!(topics = dashboard.store().len(), "Dashboard session closed");
    Ok(())
}

async fn snapshot(
    config: &Config,
    api: &DashboardApiClient,
    topics: &[Topic],
) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dashboard_config = config.dashboard_config();
    let mut reconciler = Reconciler::new(dashboard_config.reconciler, clock.clone());
    let mut projector = ViewProjector::new(dashboard_config.projector);

    let issued_at = clock.now();
    let results = join_all(topics.iter().map(|&topic| async move {
        (topic, api.fetch_topic(topic).await)
    }))
    .await;

    let mut output = serde_json::Map::new();
    for (topic, result) in results {
        match result {
            Ok(payload) => {
                reconciler.on_poll_result(topic, issued_at, payload);
            }
            Err(e) => {
                tracing::warn!(topic = %topic, error = %e, "Fetch failed");
            }
        }
    }

    for topic in reconciler.drain_refreshes() {
        if let Some(instruction) = projector.project(topic, reconciler.store()) {
            output.insert(topic.to_string(), serde_json::to_value(&instruction)?);
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
