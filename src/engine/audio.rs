use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, SupportedBufferSize};
use crossbeam_channel::Sender;

use super::device::{find_input_device, find_output_device, DeviceSelection};
use super::graph::EffectEngine;
use super::messages::{StreamEvent, StreamKind};
use super::realtime::{realtime_pipeline, MonitorCallback, OutputCallback, PrimaryCallback};
use crate::config::EngineSettings;
use crate::error::{AudioError, AudioResult};

/// Owns the live cpal streams. Dropping it (or calling [`stop`](Self::stop))
/// closes them; the engine and its DSP state go with the input stream.
pub struct AudioEngine {
  input: cpal::Stream,
  output: cpal::Stream,
  monitor: Option<cpal::Stream>,
  sample_rate: u32,
  block_size: usize,
  events: Sender<StreamEvent>,
}

impl AudioEngine {
  /// Opens input, primary output and (if selected) monitor streams and starts
  /// them. Any failure tears down whatever was already built.
  pub fn start(
    engine: EffectEngine,
    settings: EngineSettings,
    selection: &DeviceSelection,
    monitor_blocks: usize,
    events: Sender<StreamEvent>,
  ) -> AudioResult<Self> {
    let input_dev = find_input_device(selection.input.as_deref())?;
    let output_dev = find_output_device(selection.output.as_deref())?;
    let monitor_dev = match selection.monitor.as_deref() {
      Some(name) => Some(find_output_device(Some(name))?),
      None => None,
    };

    log::info!("Input device: {}", input_dev.name().unwrap_or_else(|_| "<unknown>".into()));
    log::info!("Output device: {}", output_dev.name().unwrap_or_else(|_| "<unknown>".into()));
    match &monitor_dev {
      Some(d) => log::info!("Monitor device: {}", d.name().unwrap_or_else(|_| "<unknown>".into())),
      None => log::info!("Monitor disabled"),
    }

    let in_cfg = stream_config(&input_dev, StreamKind::Input, settings)?;
    let out_cfg = stream_config(&output_dev, StreamKind::Output, settings)?;
    let mon_cfg = match &monitor_dev {
      Some(d) => Some(stream_config(d, StreamKind::Monitor, settings)?),
      None => None,
    };

    let (primary, output_cb, monitor_cb) =
      realtime_pipeline(engine, settings.block_size, monitor_dev.as_ref().map(|_| monitor_blocks));

    let input = build_input_stream(&input_dev, &in_cfg, primary, events.clone())?;
    let output = build_output_stream(&output_dev, &out_cfg, output_cb, events.clone())?;
    let monitor = match (monitor_dev, mon_cfg, monitor_cb) {
      (Some(dev), Some(cfg), Some(cb)) => Some(build_monitor_stream(&dev, &cfg, cb, events.clone())?),
      _ => None,
    };

    // start the consumers first so the first processed block has somewhere to go
    output.play().map_err(|e| AudioError::StreamPlayError(e.to_string()))?;
    if let Some(m) = &monitor {
      m.play().map_err(|e| AudioError::StreamPlayError(e.to_string()))?;
    }
    input.play().map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    let engine = Self { input, output, monitor, sample_rate: settings.sample_rate, block_size: settings.block_size, events };
    log::info!(
      "Audio started: {}Hz, {} samples per block, {:.1}ms latency",
      engine.sample_rate,
      engine.block_size,
      engine.latency_ms()
    );
    let _ = engine.events.try_send(StreamEvent::Started { latency_ms: engine.latency_ms(), monitor: engine.has_monitor() });
    Ok(engine)
  }

  pub fn has_monitor(&self) -> bool { self.monitor.is_some() }

  /// One block of buffering on the way in plus one on the way out.
  pub fn latency_ms(&self) -> f32 {
    2.0 * self.block_size as f32 * 1000.0 / self.sample_rate as f32
  }

  pub fn stop(self) {
    let Self { input, output, monitor, events, .. } = self;
    drop(input);
    drop(monitor);
    drop(output);
    log::info!("Audio stopped");
    let _ = events.try_send(StreamEvent::Stopped);
  }
}

/// F32 config at the engine's sample rate with a fixed buffer of one block
/// where the device allows it.
fn stream_config(device: &cpal::Device, kind: StreamKind, settings: EngineSettings) -> AudioResult<cpal::StreamConfig> {
  let supported: Vec<cpal::SupportedStreamConfigRange> = match kind {
    StreamKind::Input => device.supported_input_configs().map_err(|e| AudioError::ConfigError(e.to_string()))?.collect(),
    StreamKind::Output | StreamKind::Monitor => {
      device.supported_output_configs().map_err(|e| AudioError::ConfigError(e.to_string()))?.collect()
    }
  };

  let rate = settings.sample_rate;
  let in_range = |c: &&cpal::SupportedStreamConfigRange| c.min_sample_rate().0 <= rate && c.max_sample_rate().0 >= rate;
  let range = supported
    .iter()
    .filter(|c| c.sample_format() == SampleFormat::F32)
    .filter(in_range)
    // fewest channels first: input only reads channel 0, outputs duplicate mono
    .min_by_key(|c| c.channels())
    .ok_or_else(|| {
      let offered: Vec<u32> = supported.iter().map(|c| c.max_sample_rate().0).collect();
      log::warn!("{} device offers no f32 config at {}Hz (max rates {:?})", kind, rate, offered);
      AudioError::ConfigError(format!("{kind} device does not support f32 at {rate}Hz"))
    })?
    .clone();

  let buffer_size = match range.buffer_size() {
    SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&(settings.block_size as u32)) => {
      cpal::BufferSize::Fixed(settings.block_size as u32)
    }
    _ => {
      log::debug!("{} device cannot fix its buffer at {} frames, using default", kind, settings.block_size);
      cpal::BufferSize::Default
    }
  };

  let mut config: cpal::StreamConfig = range.with_sample_rate(cpal::SampleRate(rate)).into();
  config.buffer_size = buffer_size;
  log::debug!("{} stream: {} ch, {}Hz, {:?}", kind, config.channels, config.sample_rate.0, config.buffer_size);
  Ok(config)
}

fn error_callback(kind: StreamKind, events: Sender<StreamEvent>) -> impl FnMut(cpal::StreamError) + Send + 'static {
  move |err| {
    log::error!("{} audio stream error: {}", kind, err);
    let _ = events.try_send(StreamEvent::Error { stream: kind, message: err.to_string() });
  }
}

fn build_input_stream(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  mut primary: PrimaryCallback,
  events: Sender<StreamEvent>,
) -> AudioResult<cpal::Stream> {
  let channels = config.channels as usize;
  device
    .build_input_stream(
      config,
      move |data: &[f32], _: &cpal::InputCallbackInfo| primary.on_input(data, channels),
      error_callback(StreamKind::Input, events),
      None,
    )
    .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}

fn build_output_stream(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  mut output: OutputCallback,
  events: Sender<StreamEvent>,
) -> AudioResult<cpal::Stream> {
  let channels = config.channels as usize;
  device
    .build_output_stream(
      config,
      move |data: &mut [f32], _: &cpal::OutputCallbackInfo| output.fill(data, channels),
      error_callback(StreamKind::Output, events),
      None,
    )
    .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}

fn build_monitor_stream(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  mut monitor: MonitorCallback,
  events: Sender<StreamEvent>,
) -> AudioResult<cpal::Stream> {
  let channels = config.channels as usize;
  device
    .build_output_stream(
      config,
      move |data: &mut [f32], _: &cpal::OutputCallbackInfo| monitor.fill(data, channels),
      error_callback(StreamKind::Monitor, events),
      None,
    )
    .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}
