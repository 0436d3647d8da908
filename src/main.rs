mod api;
mod app;
mod config;
mod event;
mod feed;
mod filter;
mod logging;
mod net;
mod stall;
mod sync;
mod timer;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "postview")]
#[command(about = "A terminal browser for a remote posts feed, filterable by user ID")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/postview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// User ID to filter by on startup
  #[arg(short, long)]
  user: Option<u64>,

  /// Print the posts for the initial filter and exit
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let initial_owner = match args.user {
    Some(id) => Some(api::OwnerId::new(id).ok_or_else(|| eyre!("--user must be positive"))?),
    None => None,
  };

  // Held until exit so buffered log lines are flushed
  let _log_guard = logging::init()?;

  if args.once {
    return app::print_once(&config, initial_owner).await;
  }

  // Initialize and run the app
  let mut app = app::App::new(config, initial_owner)?;
  app.run().await?;

  Ok(())
}
