use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = casescore_report::Args::parse();
	casescore_report::run(args).await
}
