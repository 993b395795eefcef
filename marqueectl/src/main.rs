//! `marqueectl`: browse a Marquee catalog from the terminal.

mod app;
mod cli;
mod render;

use anyhow::Result;
use clap::Parser;
use marquee_config::ConfigLoader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let load = ConfigLoader::new().with_path(cli.config.clone()).load()?;
    let app = App::connect(load.config, cli.cookie.as_deref()).await?;

    let output = match cli.command {
        Command::Status => app.status(),
        Command::Search { query, pages } => app.search(&query, pages).await?,
        Command::Discover(args) => app.discover(args).await?,
        Command::Keywords { query } => app.keywords(&query).await?,
        Command::Trending { kind, pages } => {
            app.trending(kind.into(), pages).await?
        }
        Command::SignOut => app.sign_out().await,
    };
    print!("{output}");
    Ok(())
}
