//! agodoc - Go documentation for the identifier under the Acme cursor
//!
//! Meant to be run from an Acme window tag. Diagnostics go to stderr.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agodoc::app::App;
use agodoc::cli::Cli;
use agodoc::config::LaunchConfig;

fn main() {
    // Quiet by default; RUST_LOG=agodoc=debug for the resolution trace
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agodoc=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let _cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn async_main() -> anyhow::Result<()> {
    let launch = LaunchConfig::from_env()?;
    let app = App::new().await?;
    app.run(&launch).await?;
    Ok(())
}
