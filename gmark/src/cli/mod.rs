// gmark/src/cli/mod.rs
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::client::clock::SystemClock;
use crate::client::{GalleryClient, QueryCache};
use crate::config::Settings;
use std::sync::Arc;

pub mod args;
pub mod commands;
pub mod error;

pub fn execute_command(cli: Cli, settings: &Settings) -> CliResult<()> {
    if cli.generate_config {
        println!("{}", crate::config::generate_default_config());
        return Ok(());
    }
    match cli.command {
        Some(Commands::CreateDb { path }) => commands::create_db(&path),
        Some(command) => {
            let transport = commands::create_transport(cli.remote.as_deref(), settings)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| CliError::CommandFailed(format!("Failed to start runtime: {}", e)))?;
            let cache = QueryCache::new(Arc::new(SystemClock), settings.cache.stale_after())
                .with_gc_after(settings.cache.gc_after());
            runtime.block_on(commands::run(
                command,
                GalleryClient::with_cache(transport, cache),
            ))
        }
        None => Ok(()),
    }
}
