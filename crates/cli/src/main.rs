mod cli;
mod commands;
mod host;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cosmos_core::config::{load_dotenv, StorageBackendKind};
use cosmos_core::Config;
use cosmos_layout::LayoutModel;
use cosmos_library::Library;

use crate::cli::CliArgs;
use crate::commands::App;
use crate::terminal::Terminal;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    load_dotenv();
    let mut config = Config::from_env();
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if args.memory {
        config.storage.backend = StorageBackendKind::Memory;
    }
    config.log_summary();

    let store = cosmos_storage::open_store(&config.storage).with_context(|| {
        format!(
            "failed to open record store in {}",
            config.storage.data_dir.display()
        )
    })?;
    let layout = LayoutModel::new(config.layout.clone()).context("invalid layout settings")?;
    let library = Library::startup(store, layout).await;
    info!(documents = library.documents().len(), "cosmos ready");

    let mut app = App {
        config,
        library,
        terminal: Terminal::new(),
    };

    let result = commands::run(&mut app, args.command).await;

    for notice in app.library.take_notices() {
        app.terminal.print_notice(&notice)?;
    }
    result
}
