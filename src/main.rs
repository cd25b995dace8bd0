use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use ytvideo::config::Config;
use ytvideo::provider::{OperationContext, OperationResponse, Provider};
use ytvideo::youtube::auth::ACCESS_TOKEN_ENV;

/// Declarative management of YouTube videos
#[derive(Parser, Debug)]
#[command(name = "ytvideo", version, about, long_about = None)]
struct Args {
    /// OAuth access token with the youtube scope
    #[arg(long, env = ACCESS_TOKEN_ENV, hide_env_values = true)]
    access_token: Option<String>,

    /// Config file (defaults to <config dir>/ytvideo/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the YouTube Data API base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh a video resource from its persisted state
    Read {
        /// Prior state as JSON, or @path to read it from a file
        #[arg(long)]
        state: String,
    },
    /// Read every part of a video (data source)
    DataSource {
        #[arg(long)]
        id: String,
    },
    /// Bring an existing video under management
    Import { id: String },
    /// Push title and description to a video
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    /// Always fails: videos can only be imported
    Create {
        #[arg(long)]
        id: Option<String>,
    },
    /// Stop tracking a video (the video itself is kept)
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Write client settings to the config file
    Configure {
        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// HTTP user agent
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(tracing_level).into())
                .from_env_lossy(),
        )
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ytvideo {} started with log level: {:?}", ytvideo::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ytvideo").join("ytvideo.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ytvideo").join("ytvideo.log");
    }
    PathBuf::from("ytvideo.log")
}

/// Inline JSON, or `@path` to a JSON file
fn parse_json_arg(raw: &str) -> Result<Value> {
    let content = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&content).context("Argument is not valid JSON")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(url) = &args.api_base_url {
        config.api_base_url = Some(url.clone());
    }

    if let Command::Configure { timeout_secs, user_agent } = args.command {
        if timeout_secs.is_some() {
            config.timeout_secs = timeout_secs;
        }
        if user_agent.is_some() {
            config.user_agent = user_agent;
        }
        let path = match &args.config {
            Some(path) => {
                config.save_to(path)?;
                path.clone()
            }
            None => config.save()?,
        };
        tracing::info!("Saved config to {:?}", path);
        println!("{}", path.display());
        return Ok(());
    }

    let mut provider = Provider::new(ytvideo::VERSION).with_client_options(config.client_options());
    // clap already falls back to YOUTUBE_ACCESS_TOKEN
    let token = args.access_token.unwrap_or_default();
    let diagnostics = provider.configure(&json!({ "access_token": token }));
    if diagnostics.has_error() {
        eprintln!("{}", diagnostics);
        anyhow::bail!("provider configuration failed");
    }

    // Ctrl-C cancels whichever API call is in flight
    let cancellation = CancellationToken::new();
    let ctx = OperationContext::with_cancellation(cancellation.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation.cancel();
        }
    });

    let response = run(&provider, &ctx, args.command).await?;
    report(response)
}

async fn run(provider: &Provider, ctx: &OperationContext, command: Command) -> Result<OperationResponse> {
    let unconfigured = |d: ytvideo::provider::Diagnostics| anyhow::anyhow!("{}", d);

    let response = match command {
        Command::Read { state } => {
            let state = parse_json_arg(&state)?;
            provider.video_resource().map_err(unconfigured)?.read(ctx, &state).await
        }
        Command::DataSource { id } => {
            provider
                .video_data_source()
                .map_err(unconfigured)?
                .read(ctx, &json!({ "id": id }))
                .await
        }
        Command::Import { id } => {
            provider.video_resource().map_err(unconfigured)?.import_state(ctx, &id).await
        }
        Command::Update { id, title, description } => {
            let plan = json!({ "id": id, "title": title, "description": description });
            provider.video_resource().map_err(unconfigured)?.update(ctx, &plan).await
        }
        Command::Create { id } => {
            let config = json!({ "id": id });
            provider.video_resource().map_err(unconfigured)?.create(ctx, &config).await
        }
        Command::Delete { id } => {
            let state = json!({ "id": id });
            provider.video_resource().map_err(unconfigured)?.delete(ctx, &state).await
        }
        Command::Configure { .. } => anyhow::bail!("configure does not run against the API"),
    };
    Ok(response)
}

fn report(response: OperationResponse) -> Result<()> {
    if !response.diagnostics.is_empty() {
        eprintln!("{}", response.diagnostics);
    }
    if let Some(state) = &response.state {
        println!("{}", serde_json::to_string_pretty(&state.to_value())?);
    }
    if response.succeeded() {
        Ok(())
    } else {
        anyhow::bail!("operation failed")
    }
}
