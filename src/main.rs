use std::path::PathBuf;

use anyhow::Context;
use audiocart_lib::config::AppConfig;

fn main() -> anyhow::Result<()> {
  // RUST_LOG overrides; symphonia is chatty at info
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,symphonia_core=warn,symphonia_bundle_mp3=warn"))
    .format_timestamp_millis()
    .init();

  let config_path = std::env::args_os().nth(1).map(PathBuf::from);
  let config = AppConfig::load(config_path.as_deref()).context("failed to load config")?;
  log::info!("audiocart starting up");

  audiocart_lib::run(config)
}
