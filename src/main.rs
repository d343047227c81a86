use clap::{Parser, Subcommand};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

#[macro_use]
mod output;

mod commands;
mod config;
mod error;
mod fetcher;
mod platform;
mod types;

#[derive(Parser)]
#[command(author, version, about = "Fetch an Edelweiss Data API token", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base Edelweiss API url
    #[arg(long, global = true, default_value = fetcher::DEFAULT_API_URL)]
    url: String,

    /// Only print the token
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show request details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh token to stdout (default command)
    Token {
        /// Also write the token to ../test/src/token.jwt
        #[arg(long)]
        save: bool,
        /// Write the token to this file instead of the test fixture
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory the fixture path is resolved from
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },

    /// Sign in with the device flow and store the session
    #[command(alias = "authenticate")]
    Auth {
        /// Generate a refresh token for offline use
        #[arg(long)]
        refresh_token: bool,
    },

    /// Discard the stored session
    Logout,

    /// Check current version info
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    output::init(output::Verbosity::from_flags(cli.quiet, cli.verbose));

    let command = cli.command.unwrap_or(Commands::Token { save: false, out: None, base_dir: None });

    let result = match command {
        Commands::Token { save, out, base_dir } =>
            commands::token::handle_token(cli.url, save, out, base_dir).await,
        Commands::Auth { refresh_token } =>
            commands::auth::handle_auth(cli.url, refresh_token).await,
        Commands::Logout => commands::logout::handle_logout().await,
        Commands::Version => {
            o_result!("edelweiss-token version: {}", env!("CARGO_PKG_VERSION").cyan());
            Ok(())
        }
    };

    if let Err(e) = result {
        o_error!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
