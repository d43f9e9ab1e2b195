use clap::Parser;
use tm_publisher::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tm_publisher::init_logging();
    tm_publisher::run(Cli::parse()).await
}
