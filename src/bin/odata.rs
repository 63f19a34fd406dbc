//! OData Query command line tool
//!
//! Renders and executes JSON query descriptions against an in-memory
//! dataset.
//!
//! # Examples
//!
//! ```bash
//! # Print the URI a query description renders to
//! odata uri query.json
//!
//! # Execute it against a dataset
//! odata --dataset northwind.json run query.json
//!
//! # List entity sets
//! odata --dataset northwind.json sets
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use odata_query::config::Settings;
use odata_query::{DataServices, InMemoryDataServices, QueryCompiler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// OData query construction and execution
#[derive(Parser, Debug)]
#[command(name = "odata")]
#[command(version = odata_query::VERSION)]
#[command(about = "Render and execute OData queries", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "ODATA_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset file, overriding the settings file
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), overriding the settings file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the absolute URI of a query description
    Uri {
        /// Query description (JSON)
        query: PathBuf,
    },

    /// Execute a query description and print the result as JSON
    Run {
        /// Query description (JSON)
        query: PathBuf,

        /// Pretty-print the result
        #[arg(short, long)]
        pretty: bool,
    },

    /// List entity sets of the dataset
    Sets,

    /// Print the effective settings
    Config,

    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(dataset) = &cli.dataset {
        settings.dataset = Some(dataset.clone());
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }

    let _guard = setup_logging(&settings, cli.no_color)?;

    match cli.command {
        Commands::Uri { query } => uri_command(&settings, &query),
        Commands::Run { query, pretty } => run_command(&settings, &query, pretty),
        Commands::Sets => sets_command(&settings),
        Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("odata {}", odata_query::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with a rolling file and console output on stderr
fn setup_logging(settings: &Settings, no_color: bool) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.log_dir).with_context(|| {
        format!("Failed to create log directory {}", settings.log_dir.display())
    })?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &settings.log_dir, "odata.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let log_level = settings
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(guard)
}

fn load_services(settings: &Settings) -> anyhow::Result<Arc<dyn DataServices>> {
    let services = match &settings.dataset {
        Some(path) => InMemoryDataServices::load(path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?,
        None => {
            debug!("No dataset configured, using empty data services");
            InMemoryDataServices::new()
        }
    };
    Ok(Arc::new(services))
}

fn read_query(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query description {}", path.display()))
}

fn uri_command(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let services = load_services(settings)?;
    let query = QueryCompiler::compile_str(services, &read_query(path)?)
        .context("Failed to compile query")?;

    println!("{}", settings.absolute_uri(&query.to_uri()));
    Ok(())
}

fn run_command(settings: &Settings, path: &Path, pretty: bool) -> anyhow::Result<()> {
    if settings.dataset.is_none() {
        bail!("No dataset configured; pass --dataset or set `dataset` in the settings file");
    }

    let services = load_services(settings)?;
    let query = QueryCompiler::compile_str(services, &read_query(path)?)
        .context("Failed to compile query")?;
    info!(uri = %query, "Running query");

    let result = match query.execute().context("Query execution failed")? {
        Some(resource) => serde_json::Value::from(resource.into_datum()?),
        None => serde_json::Value::Null,
    };

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);
    Ok(())
}

fn sets_command(settings: &Settings) -> anyhow::Result<()> {
    let services = load_services(settings)?;
    for name in services.entity_sets() {
        println!("{}", name);
    }
    Ok(())
}
