use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = arq_eval::Args::parse();

	arq_eval::run(args).await
}
