mod app;
mod cat;
mod config;
mod debug;
mod error;
mod platform;
mod render;

use env_logger::Env;

use crate::config::{Args, Config};
use crate::error::AppError;

fn start() -> Result<(), AppError> {
    let args = Args::from_env()?;
    if args.help {
        config::print_help();
        return Ok(());
    }

    let mut config = Config::discover(args.config.as_deref())?;
    args.apply(&mut config);
    log::debug!("Config: {:?}", config);

    app::run(config)
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("RainbowCat starting up");

    if let Err(e) = start() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
