mod app;
mod classifier;
mod cli;
mod config;
mod db;
mod domain;
mod infrastructure;
mod page;
mod report;
mod scan;

use anyhow::Result;
use clap::Parser;

use app::{ScanApp, ScanOverrides};
use cli::{Cli, Command};
use infrastructure::{directories, instance_guard::InstanceGuard, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Command::Models = cli.command {
        cli::print_models();
        return Ok(());
    }

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories, &config.chrome)?;

    match cli.command {
        Command::Scan {
            url,
            max_replies,
            threshold,
            model,
            no_scroll,
        } => {
            logging::init_tracing(&config, &paths)?;
            let _guard = InstanceGuard::acquire(&paths.data_dir)?;

            let (shutdown, _) = shutdown::Shutdown::new();
            shutdown::install_signal_handlers(shutdown.clone());

            let overrides = ScanOverrides {
                max_replies,
                threshold,
                model,
                no_scroll,
            };
            let scan = ScanApp::initialize(config, &paths, shutdown, &url, overrides).await?;
            scan.run().await
        }
        Command::Allowlist { action } => app::manage_allowlist(&paths, action).await,
        Command::Models => Ok(()),
    }
}
