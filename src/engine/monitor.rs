//! Bounded single-producer/single-consumer queue carrying the soundpad
//! contribution from the primary callback to the local monitor output.
//!
//! ```text
//!   primary callback ──push(chunk)──► [ rtrb ring, N blocks ] ──pop_into──► monitor callback
//! ```
//!
//! Neither side ever waits. A chunk that does not fit is dropped whole (the
//! newest one loses); an empty queue reads as silence.

use rtrb::{Consumer, Producer, RingBuffer};

pub struct MonitorProducer {
  inner: Producer<f32>,
  dropped: u64,
}

pub struct MonitorConsumer {
  inner: Consumer<f32>,
}

pub struct MonitorQueue;

impl MonitorQueue {
  /// Creates a queue holding up to `capacity_blocks` chunks of `block_size` samples.
  #[allow(clippy::new_ret_no_self)]
  pub fn new(block_size: usize, capacity_blocks: usize) -> (MonitorProducer, MonitorConsumer) {
    let capacity = block_size.max(1) * capacity_blocks.max(1);
    let (producer, consumer) = RingBuffer::new(capacity);
    (MonitorProducer { inner: producer, dropped: 0 }, MonitorConsumer { inner: consumer })
  }
}

impl MonitorProducer {
  /// Queues a whole chunk, or drops it if there is not room for all of it.
  pub fn push(&mut self, chunk: &[f32]) -> bool {
    if chunk.is_empty() {
      return true;
    }
    match self.inner.write_chunk(chunk.len()) {
      Ok(mut slots) => {
        let (first, second) = slots.as_mut_slices();
        let split = first.len();
        first.copy_from_slice(&chunk[..split]);
        second.copy_from_slice(&chunk[split..]);
        slots.commit_all();
        true
      }
      Err(_) => {
        self.dropped += 1;
        false
      }
    }
  }

  /// Chunks discarded because the queue was full.
  pub fn dropped(&self) -> u64 { self.dropped }
}

impl MonitorConsumer {
  /// Samples currently queued.
  pub fn available(&self) -> usize { self.inner.slots() }

  /// Fills `out` with whatever is queued, padding with silence. Returns the
  /// number of queued samples used.
  pub fn pop_into(&mut self, out: &mut [f32]) -> usize {
    let n = self.inner.slots().min(out.len());
    if n > 0 {
      if let Ok(chunk) = self.inner.read_chunk(n) {
        let (first, second) = chunk.as_slices();
        out[..first.len()].copy_from_slice(first);
        out[first.len()..n].copy_from_slice(second);
        chunk.commit_all();
      }
    }
    out[n..].fill(0.0);
    n
  }
}
