pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "news-admin")]
#[command(about = "News API operations - schema setup, session reaping, password digests")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the user and user_sessions tables if they do not exist")]
    Schema,

    #[command(about = "Delete session rows whose expiry has passed")]
    ReapSessions,

    #[command(about = "Print an argon2 digest for a plaintext password")]
    HashPassword {
        #[arg(help = "Plaintext password")]
        plaintext: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Schema => commands::db::schema(&config, output_format).await,
        Commands::ReapSessions => commands::db::reap_sessions(&config, output_format).await,
        Commands::HashPassword { plaintext } => commands::password::hash(&plaintext, output_format),
    }
}
