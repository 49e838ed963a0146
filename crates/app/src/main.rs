use anyhow::{anyhow, Context};
use clap::Parser;
use promptcast_app::config::AppConfig;
use promptcast_app::runtime::{self, RuntimeOptions};
use promptcast_app::template;
use promptcast_engines::EngineRegistry;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser, Debug)]
#[command(
    name = "promptcast",
    version,
    about = "Fill a prompt template and deliver it to an AI chat page"
)]
struct Cli {
    /// Target engine, e.g. "chatgpt" (see --list-engines)
    #[arg(long, short)]
    engine: Option<String>,

    /// Prompt text to deliver
    #[arg(long, short, conflicts_with = "template_file")]
    prompt: Option<String>,

    /// Template file with {{name}} placeholders
    #[arg(long)]
    template_file: Option<PathBuf>,

    /// Placeholder substitution, repeatable: --var name=value
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, String)>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List known engines and exit
    #[arg(long)]
    list_engines: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "promptcast.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(guard);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging().map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    if cli.list_engines {
        let mut registry = EngineRegistry::builtin();
        registry.merge(config.engines.clone());
        let mut names: Vec<String> = registry.names().iter().map(|s| s.to_string()).collect();
        names.sort();
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let engine_name = cli
        .engine
        .clone()
        .ok_or_else(|| anyhow!("--engine is required (see --list-engines)"))?;

    let template_text = match (&cli.prompt, &cli.template_file) {
        (Some(prompt), None) => prompt.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?,
        _ => return Err(anyhow!("one of --prompt or --template-file is required")),
    };

    let prompt_text = template::fill_placeholders(&template_text, &cli.vars);
    let unresolved = template::unresolved_placeholders(&prompt_text);
    if !unresolved.is_empty() {
        tracing::warn!(placeholders = ?unresolved, "template placeholders left unfilled");
    }

    runtime::run(RuntimeOptions {
        engine_name,
        prompt_text,
        config,
    })
    .await?;
    Ok(())
}
