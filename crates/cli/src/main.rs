//! clipforge CLI
//!
//! Scaffolds `.clipforge/` workspaces, renders prehook scripts and runs
//! project definitions through the clip pipeline against the mock provider.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate multi-clip videos from prompts and prehook scripts")]
#[command(long_about = r#"
clipforge turns a list of clip prompts into a finished video: every clip gets an
image, then a video, and the finished clips are compiled into one file.

Examples:
  clipforge init                                   # Scaffold .clipforge/ here
  clipforge script --style transformation \
      --product FlexiJoint --audience "adults experiencing joint pain"
  clipforge simulate .clipforge/projects/prehook.yaml
  clipforge projects                               # List project definitions
"#)]
struct Cli {
    /// Directory containing `.clipforge/` (defaults to current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create `.clipforge/` with a config and example projects
    Init {
        /// Overwrite an existing `.clipforge/` directory
        #[arg(long)]
        force: bool,

        /// Only write the config and one example project
        #[arg(long)]
        minimal: bool,
    },

    /// Render the two prehook clips for a product
    Script {
        /// transformation, street-testimonial or product-reveal
        #[arg(short, long)]
        style: String,

        /// Product name
        #[arg(short, long)]
        product: String,

        /// Target audience, e.g. "women aged 45-65 experiencing joint pain"
        #[arg(short, long, default_value = "")]
        audience: String,

        /// On-camera avatar description
        #[arg(long, default_value = "")]
        avatar: String,

        /// Print the clips as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a project definition through the pipeline with the mock provider
    Simulate {
        /// Path to a project YAML file
        project: PathBuf,

        /// Simulated latency of every provider call
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Time out every image call whose prompt contains this text
        #[arg(long)]
        fail_image: Option<String>,
    },

    /// List project definitions under `.clipforge/projects`
    Projects,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("clipforge={log_level},cf_core={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { force, minimal } => commands::init(&root, force, minimal).await,
        Commands::Script {
            style,
            product,
            audience,
            avatar,
            json,
        } => commands::script(&style, &product, &audience, &avatar, json),
        Commands::Simulate {
            project,
            latency_ms,
            fail_image,
        } => commands::simulate(&root, &project, latency_ms, fail_image).await,
        Commands::Projects => commands::projects(&root).await,
    }
}
