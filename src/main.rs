use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use journey_client::{ProtocolClient, Reply, RequestMode, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "journey-client")]
#[command(about = "Ask a journey-planning server for bus route solutions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Server host name (overrides the config file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Server port (overrides the config file)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Directory that stop-list resources are resolved against
    #[arg(short, long, global = true)]
    resources: Option<PathBuf>,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for the route solution over a bus line's stops
    Solution {
        /// Bus line name, resolved to a stop-list resource
        name: String,
    },

    /// Ask for the solution plus the server's testing output
    Test {
        /// Bus line name, resolved to a stop-list resource
        name: String,
    },

    /// Ask for the best path between two waypoints
    Path {
        /// Start waypoint
        start: String,
        /// End waypoint
        end: String,
    },

    /// Send a stop-list request with an explicit output type
    Request {
        /// Output type the server has to return
        #[arg(short, long, value_enum, default_value = "solution")]
        mode: Mode,

        /// Bus line name, resolved to a stop-list resource
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Solution,
    Test,
    SingleSourceBestPath,
}

impl From<Mode> for RequestMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Solution => RequestMode::Solution,
            Mode::Test => RequestMode::Test,
            Mode::SingleSourceBestPath => RequestMode::SingleSourceBestPath,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("journey_client=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(root) = cli.resources {
        settings.resource_root = root;
    }

    let client = ProtocolClient::new(settings.endpoint()?, settings.resource_store());
    tracing::debug!(endpoint = %client.endpoint(), "client ready");

    let output = match cli.command {
        Commands::Solution { name } => {
            client.server_output_for(RequestMode::Solution, &name).await
        }
        Commands::Test { name } => client.server_output_for(RequestMode::Test, &name).await,
        Commands::Path { start, end } => client.best_path_output(&start, &end).await,
        Commands::Request { mode, name } => client.server_output_for(mode.into(), &name).await,
    };

    Ok(show(&Reply::parse(&output)))
}

fn show(reply: &Reply) -> ExitCode {
    match reply {
        Reply::ClientNotice(notice) => {
            eprintln!("Client notice:");
            eprintln!("{}", notice);
            ExitCode::FAILURE
        }
        Reply::Server(answer) => {
            println!("Server response:");
            print!("{}", answer);
            if !answer.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
    }
}
