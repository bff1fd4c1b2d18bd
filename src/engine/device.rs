//! Audio device enumeration and selection.
//!
//! Which physical devices carry the voice is policy, so it lives behind
//! [`DeviceResolver`]. The default [`VirtualCableResolver`] routes the
//! processed voice into a virtual audio cable (so other apps can pick it up as
//! a microphone), takes input from a real microphone and monitors locally on a
//! real output.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::config::AppConfig;
use crate::error::{AudioError, AudioResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
  pub name: String,
  pub max_input_channels: u16,
  pub max_output_channels: u16,
}

impl DeviceInfo {
  pub fn is_input(&self) -> bool { self.max_input_channels > 0 }
  pub fn is_output(&self) -> bool { self.max_output_channels > 0 }

  /// Whether the name looks like a virtual audio cable.
  pub fn is_virtual(&self) -> bool {
    let name = self.name.to_lowercase();
    name.contains("virtual") || name.contains("cable")
  }
}

/// Device names chosen for each stream. `None` means the host default for
/// input and output; for the monitor it means no monitor stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceSelection {
  pub input: Option<String>,
  pub output: Option<String>,
  pub monitor: Option<String>,
}

impl DeviceSelection {
  /// Config overrides win over whatever the resolver picked. A disabled
  /// monitor drops the monitor device regardless.
  pub fn with_overrides(mut self, config: &AppConfig) -> Self {
    if let Some(name) = &config.input_device {
      self.input = Some(name.clone());
    }
    if let Some(name) = &config.output_device {
      self.output = Some(name.clone());
    }
    if let Some(name) = &config.monitor_device {
      self.monitor = Some(name.clone());
    }
    if !config.monitor_enabled {
      self.monitor = None;
    }
    self
  }
}

pub trait DeviceResolver {
  fn resolve(&self, devices: &[DeviceInfo]) -> DeviceSelection;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VirtualCableResolver;

impl DeviceResolver for VirtualCableResolver {
  fn resolve(&self, devices: &[DeviceInfo]) -> DeviceSelection {
    let pick = |pred: &dyn Fn(&DeviceInfo) -> bool| devices.iter().find(|d| pred(d)).map(|d| d.name.clone());
    DeviceSelection {
      input: pick(&|d| d.is_input() && !d.is_virtual()),
      output: pick(&|d| d.is_output() && d.is_virtual()),
      monitor: pick(&|d| d.is_output() && !d.is_virtual()),
    }
  }
}

/// Lists every device on the default host with its channel capabilities.
pub fn list_devices() -> AudioResult<Vec<DeviceInfo>> {
  let host = cpal::default_host();
  let devices = host.devices().map_err(|e| AudioError::ConfigError(e.to_string()))?;
  let mut out = Vec::new();
  for device in devices {
    let name = match device.name() {
      Ok(n) => n,
      Err(_) => continue,
    };
    let max_input_channels = device
      .supported_input_configs()
      .map(|cfgs| cfgs.map(|c| c.channels()).max().unwrap_or(0))
      .unwrap_or(0);
    let max_output_channels = device
      .supported_output_configs()
      .map(|cfgs| cfgs.map(|c| c.channels()).max().unwrap_or(0))
      .unwrap_or(0);
    out.push(DeviceInfo { name, max_input_channels, max_output_channels });
  }
  log::debug!("Enumerated {} audio devices", out.len());
  Ok(out)
}

/// Input device by name, or the host default.
pub fn find_input_device(name: Option<&str>) -> AudioResult<cpal::Device> {
  let host = cpal::default_host();
  match name {
    Some(name) => host
      .input_devices()
      .map_err(|e| AudioError::ConfigError(e.to_string()))?
      .find(|d| d.name().ok().as_deref() == Some(name))
      .ok_or_else(|| AudioError::DeviceNotFound(name.to_string())),
    None => host.default_input_device().ok_or(AudioError::NoDevice("input")),
  }
}

/// Output device by name, or the host default.
pub fn find_output_device(name: Option<&str>) -> AudioResult<cpal::Device> {
  let host = cpal::default_host();
  match name {
    Some(name) => host
      .output_devices()
      .map_err(|e| AudioError::ConfigError(e.to_string()))?
      .find(|d| d.name().ok().as_deref() == Some(name))
      .ok_or_else(|| AudioError::DeviceNotFound(name.to_string())),
    None => host.default_output_device().ok_or(AudioError::NoDevice("output")),
  }
}
