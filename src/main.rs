mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use restobot::booking::NewBooking;
use restobot::config::RestobotConfig;
use restobot::server;

#[derive(Parser)]
#[command(
    name = "restobot",
    version,
    about = "Restaurant booking assistant with streaming agent and MCP tools"
)]
struct Cli {
    /// Config file (default: ~/.restobot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server (invocations, health, MCP)
    Serve {
        /// Serve the booking tools over MCP stdio instead
        #[arg(long)]
        stdio: bool,
    },
    /// Send one prompt to the agent and stream the answer
    Chat {
        prompt: String,
        /// Use a canned script instead of the model endpoint
        #[arg(long)]
        offline: bool,
        /// Go through an in-process HTTP server
        #[arg(long)]
        http: bool,
    },
    /// Inspect and edit the booking table
    Bookings {
        #[command(subcommand)]
        action: BookingsAction,
    },
    /// Manage the local knowledge base
    Kb {
        #[command(subcommand)]
        action: KbAction,
    },
    /// Print tool names and input schemas
    Tools,
    /// Run database diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum BookingsAction {
    /// List bookings, one page at a time
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Continuation token from a previous page
        #[arg(long)]
        token: Option<String>,
    },
    /// Show one booking
    Show { booking_id: String, restaurant_name: String },
    /// Create a booking
    Create {
        #[arg(long)]
        date: String,
        #[arg(long)]
        hour: String,
        #[arg(long)]
        restaurant: String,
        #[arg(long)]
        guest: String,
        #[arg(long)]
        guests: u32,
    },
    /// Delete a booking
    Delete { booking_id: String, restaurant_name: String },
}

#[derive(Subcommand)]
enum KbAction {
    /// Import .md/.txt files (a file or a directory)
    Import { path: PathBuf },
    /// Keyword search over imported passages
    Search {
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RestobotConfig::load_from(path)?,
        None => RestobotConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC and streamed answers.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { stdio: true } => server::serve_stdio(config).await?,
        Command::Serve { stdio: false } => {
            let provider = server::default_provider(&config)?;
            server::serve_http(config, provider).await?;
        }
        Command::Chat { prompt, offline, http } => {
            cli::chat::chat(&config, &prompt, offline, http).await?;
        }
        Command::Bookings { action } => match action {
            BookingsAction::List { limit, token } => {
                cli::bookings::list(&config, limit, token.as_deref())?
            }
            BookingsAction::Show { booking_id, restaurant_name } => {
                cli::bookings::show(&config, &booking_id, &restaurant_name)?
            }
            BookingsAction::Create { date, hour, restaurant, guest, guests } => {
                cli::bookings::create(
                    &config,
                    NewBooking {
                        date,
                        hour,
                        restaurant_name: restaurant,
                        guest_name: guest,
                        num_guests: guests,
                    },
                )?
            }
            BookingsAction::Delete { booking_id, restaurant_name } => {
                cli::bookings::delete(&config, &booking_id, &restaurant_name)?
            }
        },
        Command::Kb { action } => match action {
            KbAction::Import { path } => cli::kb::import(&config, &path)?,
            KbAction::Search { query, limit } => cli::kb::search(&config, &query, limit)?,
        },
        Command::Tools => cli::tools(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
