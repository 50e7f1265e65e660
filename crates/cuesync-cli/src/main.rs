use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cuesync_core::settings::SettingsManager;

mod cli;
mod logging;
mod run;

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("cuesync"))
        .unwrap_or_else(|| PathBuf::from(".cuesync"))
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    let _log_guard = logging::init_logging(args.log_level.as_deref(), args.log_dir.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cuesync-cli starting");

    let config_dir = args.config_dir.clone().unwrap_or_else(default_config_dir);
    let settings = SettingsManager::new(config_dir.clone()).load();

    match args.command {
        cli::Command::Match(cmd) => run::run_match(cmd, &settings),
        cli::Command::Check(cmd) => run::run_check(cmd, &settings),
        cli::Command::Shift(cmd) => run::run_shift(cmd, &settings),
        cli::Command::Convert(cmd) => run::run_convert(cmd),
        cli::Command::Settings(cmd) => run::run_settings(cmd, &config_dir),
    }
}
