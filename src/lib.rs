pub mod engine {
  pub mod audio;
  pub mod device;
  pub mod dsp;
  pub mod effects;
  pub mod graph;
  pub mod messages;
  pub mod monitor;
  pub mod realtime;
  pub mod soundpad;
  pub mod state;
}
pub mod clip;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
mod console;

use anyhow::Context;
use crossbeam_channel::bounded;

use crate::clip::SoundLibrary;
use crate::commands::Controller;
use crate::config::AppConfig;
use crate::console::Console;
use crate::engine::audio::AudioEngine;
use crate::engine::device::{list_devices, DeviceResolver, DeviceSelection, VirtualCableResolver};
use crate::engine::graph::EffectEngine;
use crate::engine::state::SharedState;

/// Stream events buffered between the audio callbacks and the console.
const EVENT_QUEUE: usize = 64;

/// Builds the engine, starts audio and runs the console until `quit`.
///
/// Invalid engine settings or filter designs abort before any device is
/// opened. Device failures do not: the console keeps running without audio.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
  let settings = config.engine_settings().context("invalid engine settings")?;
  let shared = SharedState::new(config.initial_effect, config.soundpad_volume);
  let engine = EffectEngine::new(settings, shared.clone()).context("failed to build effect engine")?;
  log::info!("Engine ready: {}Hz, block {} ({:.1}ms), effect {}", settings.sample_rate, settings.block_size, settings.block_ms(), config.initial_effect);

  let selection = match list_devices() {
    Ok(devices) => VirtualCableResolver.resolve(&devices),
    Err(e) => {
      log::warn!("Device enumeration failed, using defaults: {}", e);
      DeviceSelection::default()
    }
  }
  .with_overrides(&config);

  let (event_tx, event_rx) = bounded(EVENT_QUEUE);
  let audio = match AudioEngine::start(engine, settings, &selection, config.monitor_queue_blocks, event_tx) {
    Ok(audio) => Some(audio),
    Err(e) => {
      log::error!("Audio failed to start, continuing without sound: {}", e);
      None
    }
  };

  let controller = Controller::new(shared, SoundLibrary::new(&config.sounds_dir), settings.sample_rate);
  let result = Console::new(controller, settings).run(event_rx);

  if let Some(audio) = audio {
    audio.stop();
  }
  result
}
