use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maptomethod::config::Config;

mod commands;

use commands::{MapParams, MatchMode, OutputFormat, QueryParams};

#[derive(Parser)]
#[command(
    name = "maptomethod",
    version,
    about = "Map entities of semantic data documents onto method graphs and emit YARRRML rules",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file (defaults to MAPTOMETHOD_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Authorization header value or bare bearer token
    /// (falls back to MAPTOMETHOD_AUTHORIZATION)
    #[arg(long, global = true)]
    authorization: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the data document's subjects
    Subjects {
        /// Data document URL or path
        url: String,

        /// Class filter (repeatable, replaces the configured classes)
        #[arg(long = "class")]
        classes: Vec<String>,

        /// How class filters match
        #[arg(long = "match", value_enum)]
        mode: Option<MatchMode>,

        /// Write the result as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the template graph's objects
    Objects {
        /// Template graph URL or path
        url: String,

        /// Class filter (repeatable, replaces the configured classes)
        #[arg(long = "class")]
        classes: Vec<String>,

        /// How class filters match
        #[arg(long = "match", value_enum)]
        mode: Option<MatchMode>,

        /// Write the result as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every rdf:type used in a document
    Types {
        /// Document URL or path
        url: String,
    },

    /// Print the subclass closure of a class
    Resolve {
        /// Class IRI
        class: String,
    },

    /// Print the ontology registry
    Registry,

    /// Generate a mapping document
    Map {
        /// Data document URL or path
        data_url: String,

        /// Template graph URL or path
        template_url: String,

        /// Pair as TEMPLATE_ID=DATA_ID (repeatable)
        #[arg(short, long = "pair")]
        pairs: Vec<String>,

        /// JSON object file of template id -> data id
        #[arg(long)]
        pairs_file: Option<PathBuf>,

        /// Data entities written earlier by `subjects --output`
        #[arg(long)]
        data_entities: Option<PathBuf>,

        /// Predicate linking data rows to template entities
        #[arg(long)]
        predicate: Option<String>,

        /// Duplicate the template per data row
        #[arg(long)]
        rowwise: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: OutputFormat,

        /// Output file, or directory to write the derived filename into
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    let authorization = cli
        .authorization
        .clone()
        .or_else(|| std::env::var("MAPTOMETHOD_AUTHORIZATION").ok());

    match cli.command {
        Commands::Subjects {
            url,
            classes,
            mode,
            output,
        } => {
            tracing::info!(url = %url, classes = classes.len(), "Starting subjects command");
            commands::subjects(
                config,
                QueryParams {
                    url,
                    classes,
                    mode,
                    output,
                    authorization,
                },
            )
            .await?;
        }

        Commands::Objects {
            url,
            classes,
            mode,
            output,
        } => {
            tracing::info!(url = %url, classes = classes.len(), "Starting objects command");
            commands::objects(
                config,
                QueryParams {
                    url,
                    classes,
                    mode,
                    output,
                    authorization,
                },
            )
            .await?;
        }

        Commands::Types { url } => {
            tracing::info!(url = %url, "Starting types command");
            commands::types(config, url, authorization).await?;
        }

        Commands::Resolve { class } => {
            tracing::info!(class = %class, "Starting resolve command");
            commands::resolve(config, class, authorization).await?;
        }

        Commands::Registry => {
            commands::registry()?;
        }

        Commands::Map {
            data_url,
            template_url,
            pairs,
            pairs_file,
            data_entities,
            predicate,
            rowwise,
            format,
            output,
        } => {
            tracing::info!(
                data = %data_url,
                template = %template_url,
                pairs = pairs.len(),
                pairs_file = ?pairs_file,
                "Starting map command"
            );
            commands::map(
                config,
                MapParams {
                    data_url,
                    template_url,
                    pairs,
                    pairs_file,
                    data_entities,
                    predicate,
                    rowwise,
                    format,
                    output,
                    authorization,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("maptomethod=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("maptomethod={level},warn"))
            .context("Invalid log level")?
    };

    // Logs go to stderr so generated documents can be piped
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
