mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod output;
mod pricing;
mod store;
mod utils;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    let config = Config::load();
    let cli = Cli::parse().with_config(&config);

    utils::init_logging(cli.debug);
    for warning in &config.load_warnings {
        tracing::warn!("{warning}");
    }

    if let Err(e) = app::run(&cli, &config) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
