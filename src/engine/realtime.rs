//! Device-independent halves of the live audio path.
//!
//! cpal hands input and output to separate callbacks, so the primary path is
//! split in two: [`PrimaryCallback`] runs on the input stream, gathers fixed
//! blocks, runs the [`EffectEngine`] and pushes the result into an rtrb ring
//! that [`OutputCallback`] drains on the primary output stream.
//! [`MonitorCallback`] drains the monitor queue on its own device.
//!
//! Nothing here allocates, locks (beyond the soundpad's short critical
//! section inside the engine) or logs once constructed.

use rtrb::{Consumer, Producer, RingBuffer};

use super::graph::{clip_output, EffectEngine, OUTPUT_LIMIT};
use super::monitor::{MonitorConsumer, MonitorProducer, MonitorQueue};

/// Capacity of the input → output ring, in blocks.
pub const OUTPUT_RING_BLOCKS: usize = 4;

pub struct PrimaryCallback {
  engine: EffectEngine,
  block: Vec<f32>,
  filled: usize,
  output: Producer<f32>,
  monitor: Option<MonitorProducer>,
  overruns: u64,
  blocks: u64,
}

pub struct OutputCallback {
  input: Consumer<f32>,
  underruns: u64,
}

pub struct MonitorCallback {
  queue: MonitorConsumer,
  scratch: Vec<f32>,
}

/// Wires the three callbacks together. `monitor_blocks` of `None` leaves the
/// monitor path out entirely.
pub fn realtime_pipeline(
  engine: EffectEngine,
  block_size: usize,
  monitor_blocks: Option<usize>,
) -> (PrimaryCallback, OutputCallback, Option<MonitorCallback>) {
  let block_size = block_size.max(1);
  let (output, input) = RingBuffer::new(block_size * OUTPUT_RING_BLOCKS);
  let (monitor_tx, monitor_rx) = match monitor_blocks {
    Some(blocks) => {
      let (tx, rx) = MonitorQueue::new(block_size, blocks);
      (Some(tx), Some(MonitorCallback { queue: rx, scratch: vec![0.0; block_size] }))
    }
    None => (None, None),
  };
  let primary = PrimaryCallback {
    engine,
    block: vec![0.0; block_size],
    filled: 0,
    output,
    monitor: monitor_tx,
    overruns: 0,
    blocks: 0,
  };
  (primary, OutputCallback { input, underruns: 0 }, monitor_rx)
}

impl PrimaryCallback {
  /// Feeds interleaved input frames; only channel 0 is used.
  pub fn on_input(&mut self, data: &[f32], channels: usize) {
    for frame in data.chunks(channels.max(1)) {
      self.block[self.filled] = frame[0];
      self.filled += 1;
      if self.filled == self.block.len() {
        self.process_block();
        self.filled = 0;
      }
    }
  }

  fn process_block(&mut self) {
    self.engine.process(&mut self.block);
    clip_output(&mut self.block, OUTPUT_LIMIT);
    self.blocks += 1;

    let n = self.output.slots().min(self.block.len());
    if n < self.block.len() {
      self.overruns += 1;
    }
    if let Ok(mut chunk) = self.output.write_chunk(n) {
      let (first, second) = chunk.as_mut_slices();
      let split = first.len();
      first.copy_from_slice(&self.block[..split]);
      second.copy_from_slice(&self.block[split..n]);
      chunk.commit_all();
    }

    if let Some(monitor) = self.monitor.as_mut() {
      let chunk = self.engine.soundpad_chunk();
      if chunk.iter().any(|&x| x != 0.0) {
        monitor.push(chunk);
      }
    }
  }

  pub fn engine(&self) -> &EffectEngine { &self.engine }

  /// Blocks processed so far.
  pub fn blocks(&self) -> u64 { self.blocks }

  /// Blocks that did not fully fit in the output ring.
  pub fn overruns(&self) -> u64 { self.overruns }

  /// Monitor chunks dropped because the queue was full.
  pub fn monitor_dropped(&self) -> u64 { self.monitor.as_ref().map_or(0, MonitorProducer::dropped) }
}

impl OutputCallback {
  /// Fills interleaved output, duplicating each mono sample to every channel.
  pub fn fill(&mut self, data: &mut [f32], channels: usize) {
    let mut short = false;
    for frame in data.chunks_mut(channels.max(1)) {
      let s = match self.input.pop() {
        Ok(s) => s,
        Err(_) => {
          short = true;
          0.0
        }
      };
      frame.fill(s);
    }
    if short {
      self.underruns += 1;
    }
  }

  /// Callbacks that ran out of processed samples.
  pub fn underruns(&self) -> u64 { self.underruns }
}

impl MonitorCallback {
  pub fn fill(&mut self, data: &mut [f32], channels: usize) {
    let channels = channels.max(1);
    let step = self.scratch.len() * channels;
    for part in data.chunks_mut(step) {
      let frames = part.len().div_ceil(channels);
      let scratch = &mut self.scratch[..frames];
      self.queue.pop_into(scratch);
      for (frame, &s) in part.chunks_mut(channels).zip(scratch.iter()) {
        frame.fill(s);
      }
    }
  }
}
