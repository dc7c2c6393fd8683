pub mod server;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use memos_config::FileSource;
use memos_service::MemosService;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> Result<()> {
	let config = memos_config::load(&args.config)?;

	init_tracing(&config)?;

	// Tools re-read the file on every call; the startup load only fixes the bind address.
	let service = MemosService::new(Arc::new(FileSource::new(&args.config)));

	server::serve_mcp(&config.service.mcp_bind, service).await
}

fn init_tracing(config: &memos_config::Config) -> Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.try_init()
		.map_err(|e| color_eyre::eyre::eyre!(e))?;

	Ok(())
}
