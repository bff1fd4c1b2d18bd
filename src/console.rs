//! Line-oriented operator console: reads commands from stdin and drives the
//! [`Controller`], while stream events from the audio callbacks are logged.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{bail, Context};
use crossbeam_channel::{bounded, never, select, Receiver};

use crate::commands::Controller;
use crate::config::EngineSettings;
use crate::engine::device::list_devices;
use crate::engine::effects::EffectKind;
use crate::engine::messages::StreamEvent;
use crate::render::render_file;

const HELP: &str = "commands: effect <name> | play <id> | stop | volume <0..1> | status | sounds | devices | render <in.wav> <out.wav> [effect] | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  Effect(String),
  Play(String),
  Stop,
  Volume(f32),
  Status,
  Sounds,
  Devices,
  Render { input: PathBuf, output: PathBuf, effect: Option<String> },
  Help,
  Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
  let mut words = line.split_whitespace();
  let Some(head) = words.next() else {
    return Ok(None);
  };
  let args: Vec<&str> = words.collect();
  let cmd = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
    ("effect", [name]) => Command::Effect(name.to_string()),
    ("play", [id]) => Command::Play(id.to_string()),
    ("stop", []) => Command::Stop,
    ("volume", [v]) => Command::Volume(v.parse().with_context(|| format!("invalid volume '{v}'"))?),
    ("status", []) => Command::Status,
    ("sounds", []) => Command::Sounds,
    ("devices", []) => Command::Devices,
    ("render", [input, output]) => Command::Render { input: input.into(), output: output.into(), effect: None },
    ("render", [input, output, effect]) => {
      Command::Render { input: input.into(), output: output.into(), effect: Some(effect.to_string()) }
    }
    ("help" | "?", []) => Command::Help,
    ("quit" | "exit", []) => Command::Quit,
    (other, _) => bail!("unrecognized command '{}' ({} args); try 'help'", other, args.len()),
  };
  Ok(Some(cmd))
}

pub struct Console {
  controller: Controller,
  settings: EngineSettings,
}

impl Console {
  pub fn new(controller: Controller, settings: EngineSettings) -> Self {
    Self { controller, settings }
  }

  /// Runs one command, writing the reply to `out`. Command failures are
  /// replies, not errors; only a failed write is.
  pub fn execute(&self, cmd: Command, out: &mut impl Write) -> io::Result<Flow> {
    match cmd {
      Command::Effect(name) => writeln!(out, "effect: {}", self.controller.set_effect(&name))?,
      Command::Play(id) => match self.controller.play_sound_id(&id) {
        Ok(len) => writeln!(out, "playing {} ({:.2}s)", id, len as f32 / self.settings.sample_rate as f32)?,
        Err(e) => writeln!(out, "error: {e}")?,
      },
      Command::Stop => {
        self.controller.stop_sound();
        writeln!(out, "stopped")?;
      }
      Command::Volume(v) => writeln!(out, "volume: {:.2}", self.controller.set_volume(v))?,
      Command::Status => {
        let status = self.controller.status();
        writeln!(out, "effect: {}, playing: {}, volume: {:.2}", self.controller.effect(), status.playing, status.volume)?;
      }
      Command::Sounds => {
        let sounds = self.controller.sounds();
        if sounds.is_empty() {
          writeln!(out, "no sounds in {}", self.controller.library().dir().display())?;
        }
        for id in sounds {
          writeln!(out, "  {id}")?;
        }
      }
      Command::Devices => match list_devices() {
        Ok(devices) => {
          for d in devices {
            writeln!(out, "  {} (in: {}, out: {})", d.name, d.max_input_channels, d.max_output_channels)?;
          }
        }
        Err(e) => writeln!(out, "error: {e}")?,
      },
      Command::Render { input, output, effect } => {
        let kind = effect.as_deref().map_or_else(|| self.controller.effect(), EffectKind::from_name);
        match render_file(&input, &output, kind, self.settings) {
          Ok(summary) => writeln!(out, "rendered {} samples with {} to {}", summary.samples, kind, output.display())?,
          Err(e) => writeln!(out, "error: {e}")?,
        }
      }
      Command::Help => writeln!(out, "{HELP}")?,
      Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
  }

  /// Reads stdin until `quit` or end of input, logging stream events as they arrive.
  pub fn run(self, events: Receiver<StreamEvent>) -> anyhow::Result<()> {
    let (line_tx, line_rx) = bounded::<String>(16);
    thread::Builder::new()
      .name("console-stdin".into())
      .spawn(move || {
        for line in io::stdin().lock().lines() {
          match line {
            Ok(line) => {
              if line_tx.send(line).is_err() {
                break;
              }
            }
            Err(e) => {
              log::error!("stdin read failed: {}", e);
              break;
            }
          }
        }
      })
      .context("failed to spawn stdin reader")?;

    let stdout = io::stdout();
    let closed: Receiver<StreamEvent> = never();
    let mut events_open = true;
    writeln!(stdout.lock(), "{HELP}")?;
    loop {
      let events_rx = if events_open { &events } else { &closed };
      select! {
        recv(line_rx) -> line => {
          let Ok(line) = line else { break };
          let mut out = stdout.lock();
          match parse_command(&line) {
            Ok(Some(cmd)) => {
              if self.execute(cmd, &mut out)? == Flow::Quit {
                break;
              }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "error: {e:#}")?,
          }
          out.flush()?;
        }
        recv(events_rx) -> ev => match ev {
          Ok(StreamEvent::Error { stream, message }) => log::error!("{} stream failed: {}", stream, message),
          Ok(StreamEvent::Started { latency_ms, monitor }) => log::info!("Streams running ({:.1}ms, monitor: {})", latency_ms, monitor),
          Ok(StreamEvent::Stopped) => log::info!("Streams stopped"),
          // all senders gone: stop selecting on it
          Err(_) => events_open = false,
        },
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clip::SoundLibrary;
  use crate::engine::state::SharedState;

  fn console() -> Console {
    let controller = Controller::new(SharedState::new(EffectKind::None, 0.7), SoundLibrary::new("/no/such/dir"), 44_100);
    Console::new(controller, EngineSettings::default())
  }

  fn run(console: &Console, line: &str) -> (Flow, String) {
    let cmd = parse_command(line).unwrap().unwrap();
    let mut out = Vec::new();
    let flow = console.execute(cmd, &mut out).unwrap();
    (flow, String::from_utf8(out).unwrap())
  }

  #[test]
  fn test_parse_commands() {
    assert_eq!(parse_command("  ").unwrap(), None);
    assert_eq!(parse_command("effect pitch_up").unwrap(), Some(Command::Effect("pitch_up".into())));
    assert_eq!(parse_command("VOLUME 0.5").unwrap(), Some(Command::Volume(0.5)));
    assert_eq!(
      parse_command("render a.wav b.wav echo").unwrap(),
      Some(Command::Render { input: "a.wav".into(), output: "b.wav".into(), effect: Some("echo".into()) })
    );
    assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse_command("volume loud").is_err());
    assert!(parse_command("effect").is_err());
    assert!(parse_command("dance").is_err());
  }

  #[test]
  fn test_execute_replies() {
    let c = console();
    assert_eq!(run(&c, "effect radio").1, "effect: radio\n");
    assert_eq!(run(&c, "effect bogus").1, "effect: none\n");
    assert_eq!(run(&c, "volume 3").1, "volume: 1.00\n");
    assert_eq!(run(&c, "status").1, "effect: none, playing: false, volume: 1.00\n");
    assert!(run(&c, "play airhorn").1.starts_with("error: sound not found"));
    assert_eq!(run(&c, "quit").0, Flow::Quit);
  }
}
