//! jsonbatch CLI - run batch templates

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use jsonbatch::{
    BatchConfig, BatchEngine, BatchError, BatchTemplate, Document, FixSuggestion, HttpDispatcher,
    MockDispatcher, Request, RequestDispatcher, TemplateBuilder,
};

#[derive(Parser)]
#[command(name = "jsonbatch")]
#[command(about = "jsonbatch - declarative batch templates for chained HTTP requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a batch template
    Run {
        /// Path to the template (.json, .yaml or .yml)
        template: PathBuf,

        /// Original request file (defaults to an empty request)
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Print single-line JSON
        #[arg(long)]
        compact: bool,

        /// Answer every request with `200 null` instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Resolve one template value against a context document
    Eval {
        /// JSON template value, or a bare expression string
        schema: String,

        /// Context document (.json, .yaml or .yml)
        #[arg(short, long)]
        context: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Only print the config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = BatchConfig::load().map(BatchConfig::with_env);
    let filter = config
        .as_ref()
        .map(|c| c.log.filter.clone())
        .unwrap_or_else(|_| "info".to_string());

    // stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let result = match config {
        Ok(config) => match cli.command {
            Commands::Run {
                template,
                request,
                compact,
                dry_run,
            } => run_batch(&config, &template, request.as_deref(), compact, dry_run).await,
            Commands::Eval { schema, context } => eval_schema(&schema, context.as_deref()),
            Commands::Config { path } => show_config(&config, path),
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(error: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), error);
    if let Some(suggestion) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<BatchError>())
        .and_then(|e| e.fix_suggestion())
    {
        eprintln!("  {} {}", "Fix:".yellow(), suggestion);
    }
}

/// Read a JSON or YAML file by extension
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(BatchError::from)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(BatchError::from)?,
        _ => serde_json::from_str(&text).map_err(BatchError::from)?,
    };
    Ok(value)
}

fn print_json(value: &Value, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}

async fn run_batch(
    config: &BatchConfig,
    template_path: &Path,
    request_path: Option<&Path>,
    compact: bool,
    dry_run: bool,
) -> Result<()> {
    let template = BatchTemplate::load(template_path)
        .with_context(|| format!("cannot load template {}", template_path.display()))?;
    let original: Request = match request_path {
        Some(path) => read_document(path)?,
        None => Request::default(),
    };

    let dispatcher: Arc<dyn RequestDispatcher> = if dry_run {
        Arc::new(MockDispatcher::new())
    } else {
        Arc::new(HttpDispatcher::new(config.http.clone()))
    };
    let engine = BatchEngine::new(dispatcher).with_default_options(config.dispatch);

    let response = engine.execute(&original, &template).await?;
    print_json(&response.to_value(), compact)
}

fn eval_schema(schema: &str, context_path: Option<&Path>) -> Result<()> {
    let template: Value =
        serde_json::from_str(schema).unwrap_or_else(|_| Value::String(schema.to_string()));
    let context: Value = match context_path {
        Some(path) => read_document(path)?,
        None => Value::Object(Default::default()),
    };

    let value = TemplateBuilder::default().build(&template, &Document::new(context))?;
    print_json(&value, false)
}

fn show_config(config: &BatchConfig, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", BatchConfig::config_path().display());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
