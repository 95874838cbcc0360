use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = arq_api::Args::parse();

	arq_api::run(args).await
}
