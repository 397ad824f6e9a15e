mod commands;
mod output;

use clap::{Parser, Subcommand};
use dataspace_core::config;
use dataspace_core::{DatasetFilter, DataspaceContext};
use miette::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::commands::dataset::DatasetArgs;
use crate::output::Output;

#[derive(Parser)]
#[command(name = "dataspace-cli")]
#[command(about = "Aggregate and publish dataset catalogs across Solid pods")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every registered catalog into one view
    Aggregate {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Theme IRI or theme name
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        publisher: Option<String>,
        /// Only show datasets owned by this WebID
        #[arg(long)]
        owner: Option<String>,
        /// Hide restricted datasets
        #[arg(long)]
        public_only: bool,
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show where an owner's catalog lives (defaults to the configured identity)
    Locate { web_id: Option<String> },
    /// Provision the catalog containers and catalog document
    Init,
    /// Publish a new dataset
    Create {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Publish a dataset series grouping existing datasets
    CreateSeries {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Member dataset URL (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Replace an existing dataset's metadata
    Update {
        #[arg(long)]
        dataset_url: String,
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Remove a dataset from the catalog and delete its documents
    Delete {
        #[arg(long)]
        dataset_url: String,
        /// Record identifier, when it differs from the document name
        #[arg(long)]
        identifier: Option<String>,
    },
    /// Delete every dataset, series and record in the catalog
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Export the aggregated view as a Turtle catalog
    Export {
        /// Output file (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write a default configuration file
    Init {
        path: Option<PathBuf>,
        /// WebID to store as the identity
        #[arg(long)]
        web_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_appender::rolling;
    use tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dataspace")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "dataspace-cli.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = if cli.debug {
        EnvFilter::new("dataspace_core=debug,dataspace_cli=debug,info")
    } else {
        EnvFilter::new("dataspace_core=info,dataspace_cli=info,warn")
    };

    // Terminal logs go to stderr so JSON and Turtle output stay pipeable
    let terminal_layer = if cli.debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    let file_env_filter = EnvFilter::new("dataspace_core=debug,dataspace_cli=debug,info");
    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(file_env_filter))
        .init();

    debug!(
        "Logging initialized. Logs are being written to: {:?}",
        log_dir.join("dataspace-cli.log")
    );

    let output = Output::new();

    // Config commands work without a reachable pod
    if let Commands::Config { cmd } = &cli.command {
        return match cmd {
            ConfigCommands::Init { path, web_id } => {
                let path = path.as_deref().or(cli.config.as_deref());
                commands::config::init(path, web_id.as_deref(), &output).await
            }
            ConfigCommands::Show => {
                let config = load(&cli).await?;
                commands::config::show(&config, &output).await
            }
        };
    }

    let config = load(&cli).await?;
    let context = DataspaceContext::connect(config).await?;

    match cli.command {
        Commands::Aggregate {
            search,
            theme,
            publisher,
            owner,
            public_only,
            json,
        } => {
            let mut filter = DatasetFilter::new().public_only(public_only);
            if let Some(text) = search {
                filter = filter.with_text(text);
            }
            if let Some(theme) = theme {
                filter = filter.with_theme(theme);
            }
            if let Some(publisher) = publisher {
                filter = filter.with_publisher(publisher);
            }
            if let Some(owner) = owner {
                filter = filter.with_owner(owner);
            }
            commands::aggregate::aggregate(&context, &filter, json, &output).await?;
        }
        Commands::Locate { web_id } => {
            commands::aggregate::locate(&context, web_id.as_deref(), &output).await?;
        }
        Commands::Init => commands::dataset::init_catalog(&context, &output).await?,
        Commands::Create { dataset } => {
            commands::dataset::create(&context, dataset, &output).await?;
        }
        Commands::CreateSeries {
            title,
            description,
            members,
            identifier,
        } => {
            commands::dataset::create_series(
                &context,
                title,
                description,
                members,
                identifier,
                &output,
            )
            .await?;
        }
        Commands::Update {
            dataset_url,
            dataset,
        } => {
            commands::dataset::update(&context, dataset_url, dataset, &output).await?;
        }
        Commands::Delete {
            dataset_url,
            identifier,
        } => {
            commands::dataset::delete(&context, &dataset_url, identifier.as_deref(), &output)
                .await?;
        }
        Commands::Reset { yes } => commands::dataset::reset(&context, yes, &output).await?,
        Commands::Export { output: path } => {
            commands::aggregate::export(&context, path.as_deref(), &output).await?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn load(cli: &Cli) -> Result<config::DataspaceConfig> {
    let config = if let Some(config_path) = &cli.config {
        debug!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        debug!("Loading config from standard locations");
        config::load_config_from_standard_locations().await?
    };
    Ok(config)
}
