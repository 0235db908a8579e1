use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "nova",
    about = "Inspect NOVA storefront sessions and product images",
    long_about = None
)]
struct Options {
    /// JSON file standing in for browser storage
    #[arg(
        long,
        env = "NOVA_SESSION_FILE",
        default_value = ".nova-session.json",
        global = true
    )]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a bearer token's claims. The signature is not checked.
    Decode { token: String },
    /// Issue an unsigned token for local development
    MockToken(commands::MockTokenArgs),
    /// Store a token (and optional role/profile) as the current session
    Login {
        #[arg(long)]
        token: String,
        /// Plain role kept alongside the token
        #[arg(long)]
        role: Option<String>,
        /// Opaque profile JSON
        #[arg(long)]
        user_data: Option<String>,
    },
    /// Print the current session
    Whoami,
    /// Remove every session key
    Logout,
    /// Resolve one image reference to a fetchable URL
    Image { reference: String },
    /// Resolve the images of a product JSON record (`-` reads stdin)
    ProductImages { path: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Options::parse();
    match opts.command {
        Command::Decode { token } => commands::decode(&token),
        Command::MockToken(args) => commands::mock_token(&args),
        Command::Login {
            token,
            role,
            user_data,
        } => commands::login(&opts.store, &token, role.as_deref(), user_data.as_deref()),
        Command::Whoami => commands::whoami(&opts.store),
        Command::Logout => commands::logout(&opts.store),
        Command::Image { reference } => commands::image(&reference),
        Command::ProductImages { path } => commands::product_images(&path),
    }
}
