//! apivet CLI entrypoint
//! Parses command-line arguments and either serves the validator over HTTP or
//! checks a single document.

// Internal imports (std, crate)
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

// External imports (alphabetized)
use anyhow::Context;
use apivet_core::{
    render_text, Config, ResultView, StagingStrategy, StructuredResponse, SubmitRequest, Validator,
};
use clap::Parser;
use reqwest::Url;
use tokio::fs;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apivet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Serve the validator and its editor page over HTTP
    Serve {
        /// Path to a YAML config file (default: the per-user config file, if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        bind: Option<IpAddr>,
        /// Port to listen on (default: 3000)
        #[arg(long)]
        port: Option<u16>,
        /// How submitted documents reach the validator
        #[arg(long, value_enum)]
        staging: Option<StagingStrategy>,
    },
    /// Validate a single OpenAPI or Swagger document (YAML or JSON)
    Check {
        /// Document to validate
        file: PathBuf,
        /// Validate against a running apivet server instead of in-process
        ///
        /// Example: --server http://127.0.0.1:3000/
        #[arg(long)]
        server: Option<Url>,
        /// Path to a YAML config file (in-process checks only)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the raw JSON response instead of the summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        Commands::Check { .. } => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Serve {
            config,
            bind,
            port,
            staging,
        } => {
            let mut config = Config::load(config.as_deref())
                .await
                .context("Failed to load configuration")?;
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(staging) = staging {
                config.staging = staging;
            }
            tracing::info!("Starting apivet on {}", config.socket_addr());
            apivet_core::serve(config).await.context("Server error")?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            file,
            server,
            config,
            json,
        } => {
            let content = fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let response = match server {
                Some(server) => check_remote(&server, content).await?,
                None => check_local(config.as_deref(), &content).await?,
            };

            let view = ResultView::from_response(&response);
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", render_text(&view));
            }
            Ok(if view.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn check_local(config: Option<&Path>, content: &str) -> anyhow::Result<StructuredResponse> {
    let config = Config::load(config)
        .await
        .context("Failed to load configuration")?;
    let validator = Validator::new(&config);
    Ok(validator.submit(content).await.into())
}

async fn check_remote(server: &Url, content: String) -> anyhow::Result<StructuredResponse> {
    let endpoint = server
        .join("validate")
        .with_context(|| format!("Invalid server URL: {}", server))?;
    tracing::debug!("Posting document to {}", endpoint);

    let response = reqwest::Client::new()
        .post(endpoint.clone())
        .json(&SubmitRequest { content })
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", endpoint))?;

    let status = response.status();
    response
        .json::<StructuredResponse>()
        .await
        .with_context(|| format!("Unexpected response from {} (HTTP {})", endpoint, status))
}
