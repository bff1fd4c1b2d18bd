use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
  Input,
  Output,
  Monitor,
}

impl fmt::Display for StreamKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      StreamKind::Input => "input",
      StreamKind::Output => "output",
      StreamKind::Monitor => "monitor",
    })
  }
}

/// Reported from the stream error callbacks and the engine lifecycle to the
/// control loop. Sent with `try_send`; never blocks an audio thread.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
  Started { latency_ms: f32, monitor: bool },
  Error { stream: StreamKind, message: String },
  Stopped,
}
