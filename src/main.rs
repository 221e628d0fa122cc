use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mindflow_core::config::{API_KEY_VAR, Config};
use mindflow_core::vault::EnvVaultProvider;
use mindflow_core::{ChatService, LearningPathService, LessonService};
use mindflow_lesson::LessonPipeline;
use mindflow_llm::OpenRouterProvider;
use mindflow_store::{CachedLessonStore, SqliteStore, TtlCache};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Generate structured lessons with an LLM and keep them around.
#[derive(Debug, Parser)]
#[command(name = "mindflow", about, version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a stored lesson or generate one for TITLE
    Lesson {
        title: String,
        /// Storage key (default: derived from the title)
        #[arg(long)]
        id: Option<String>,
    },
    /// Generate a list of lesson titles for TOPIC
    Path { topic: String },
    /// Run raw model output from FILE (or stdin) through extraction, offline
    Extract {
        file: Option<PathBuf>,
        /// Topic used if a fallback lesson has to be built
        #[arg(long, default_value = "this topic")]
        topic: String,
    },
    /// Send MESSAGE to the tutor as USER and print the reply
    Chat {
        user: String,
        #[arg(required_unless_present_any = ["history", "clear"])]
        message: Option<String>,
        /// Print the stored conversation instead of sending
        #[arg(long, conflicts_with_all = ["message", "clear"])]
        history: bool,
        /// Delete the stored conversation
        #[arg(long, conflicts_with = "message")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.validate()?;
    config.resolve_secrets(&EnvVaultProvider).await?;

    match cli.command {
        Command::Lesson { title, id } => {
            let lesson_id = id.unwrap_or_else(|| lesson_id_for(&title));
            let store = open_store(&config).await?;
            let service = LessonService::new(
                build_provider(&config)?,
                CachedLessonStore::new(store, TtlCache::new(config.store.cache_ttl())),
                LessonPipeline::new(config.extraction_policy()),
                config.prompt_builder(),
                config.lesson.shape,
            );
            print_json(&service.deliver(&lesson_id, &title).await)
        }
        Command::Path { topic } => {
            let service = LearningPathService::new(
                build_provider(&config)?,
                config.prompt_builder(),
                config.extraction_policy(),
            );
            print_json(&service.generate(&topic).await)
        }
        Command::Extract { file, topic } => {
            let raw = read_input(file.as_deref()).await?;
            let pipeline = LessonPipeline::new(config.extraction_policy());
            print_json(&pipeline.run(&raw, &topic))
        }
        Command::Chat {
            user,
            message,
            history,
            clear,
        } => {
            let store = open_store(&config).await?;
            let service =
                ChatService::new(build_provider(&config)?, store, config.chat.history_limit);
            if history {
                return print_json(&service.history(&user).await?);
            }
            if clear {
                let cleared = service.clear(&user).await?;
                return print_json(&serde_json::json!({ "cleared": cleared }));
            }
            let message = message.context("a message is required")?;
            print_json(&service.send(&user, &message).await?)
        }
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // stdout carries the JSON result
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("MINDFLOW_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

fn build_provider(config: &Config) -> anyhow::Result<OpenRouterProvider> {
    let api_key = config
        .secrets
        .openrouter_api_key
        .as_ref()
        .with_context(|| format!("{API_KEY_VAR} is not set"))?;

    let provider = OpenRouterProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.timeout(),
    )
    .context("failed to build HTTP client")?
    .with_max_tokens(config.llm.max_tokens)
    .with_temperature(config.llm.temperature)
    .with_max_retries(config.llm.max_retries);

    tracing::debug!(model = provider.model(), "using openrouter provider");
    Ok(provider)
}

async fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    SqliteStore::new(&config.store.path)
        .await
        .with_context(|| format!("failed to open database {}", config.store.path))
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Lowercase slug of `title`, used as the storage key when none is given.
fn lesson_id_for(title: &str) -> String {
    let mut id = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            id.extend(c.to_lowercase());
        } else if !id.is_empty() && !id.ends_with('-') {
            id.push('-');
        }
    }
    while id.ends_with('-') {
        id.pop();
    }
    if id.is_empty() {
        "lesson".to_owned()
    } else {
        id
    }
}
