use clap::Parser;

use memos_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	memos_mcp::run(args).await
}
