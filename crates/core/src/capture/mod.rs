//! Capture-side sample accumulation and the single-slot frame handoff.
//!
//! The audio callback owns a [`SampleIngestor`] and feeds it one sample at a
//! time. Completed windows are offered to a shared [`FrameSlot`] that the
//! render context drains on its own cadence. The capture path never blocks,
//! never allocates, and never logs: when the render side falls behind, the
//! pending frame is simply replaced by the newer window so the display stays
//! fresh rather than complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{Result, SpectrumError};

/// Single-producer, single-consumer slot holding at most one unconsumed
/// analysis frame.
///
/// Handoff discipline: the producer writes the buffer only under `try_lock`
/// and publishes with a release store on the ready flag; the consumer gates
/// on an acquire load of the flag, copies the buffer out under the lock, and
/// clears the flag. A partially written frame is therefore never observed,
/// and the producer never waits on the consumer.
pub struct FrameSlot {
    window: Mutex<Vec<f32>>,
    ready: AtomicBool,
    window_size: usize,
}

impl FrameSlot {
    /// Creates a slot sized for one capture window.
    pub fn new(window_size: usize) -> Arc<Self> {
        Arc::new(Self {
            window: Mutex::new(vec![0.0; window_size]),
            ready: AtomicBool::new(false),
            window_size,
        })
    }

    /// Number of samples in one frame.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Whether an unconsumed frame is waiting.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Consumer side: copies the pending frame into `dest` and clears the
    /// ready flag. Returns `false` without touching `dest` when no frame is
    /// waiting.
    pub fn take_into(&self, dest: &mut [f32]) -> Result<bool> {
        if !self.ready.load(Ordering::Acquire) {
            return Ok(false);
        }
        if dest.len() != self.window_size {
            return Err(SpectrumError::msg(format!(
                "frame destination holds {} samples but the window size is {}",
                dest.len(),
                self.window_size
            )));
        }

        let frame = self
            .window
            .lock()
            .map_err(|_| SpectrumError::msg("frame slot has been poisoned"))?;
        dest.copy_from_slice(&frame);
        self.ready.store(false, Ordering::Release);
        Ok(true)
    }

    /// Producer side: replaces the slot contents with `window` and marks it
    /// ready. Skipped without blocking when the consumer is mid-copy.
    fn offer(&self, window: &[f32]) {
        if let Ok(mut frame) = self.window.try_lock() {
            frame.copy_from_slice(window);
            self.ready.store(true, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSlot")
            .field("window_size", &self.window_size)
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Accumulates incoming samples into a fixed-size capture window and hands
/// off full windows to the shared [`FrameSlot`].
///
/// Intended to be moved into the audio capture callback; obtain one from
/// [`SpectrumVisualiser::ingestor`](crate::SpectrumVisualiser::ingestor).
#[derive(Debug)]
pub struct SampleIngestor {
    window: Vec<f32>,
    cursor: usize,
    slot: Arc<FrameSlot>,
}

impl SampleIngestor {
    /// Creates an ingestor whose window size matches the slot it feeds.
    pub fn new(slot: Arc<FrameSlot>) -> Self {
        Self {
            window: vec![0.0; slot.window_size()],
            cursor: 0,
            slot,
        }
    }

    /// Appends one sample at the write cursor. When the window fills, the
    /// completed window is offered to the frame slot and accumulation
    /// restarts from the beginning.
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.window[self.cursor] = sample;
        self.cursor += 1;

        if self.cursor == self.window.len() {
            self.slot.offer(&self.window);
            self.cursor = 0;
        }
    }

    /// Feeds a block of samples, one scalar per frame. Channel selection or
    /// downmixing is the caller's responsibility.
    pub fn push_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push(sample);
        }
    }

    /// Current write cursor, always in `[0, window_size)`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: usize = 64;

    fn fixture() -> (SampleIngestor, Arc<FrameSlot>) {
        let slot = FrameSlot::new(WINDOW);
        (SampleIngestor::new(slot.clone()), slot)
    }

    #[test]
    fn cursor_wraps_exactly_at_window_size() {
        let (mut ingestor, _slot) = fixture();
        for i in 0..WINDOW - 1 {
            ingestor.push(0.0);
            assert_eq!(ingestor.cursor(), i + 1);
        }
        ingestor.push(0.0);
        assert_eq!(ingestor.cursor(), 0);
    }

    #[test]
    fn full_window_is_handed_off() {
        let (mut ingestor, slot) = fixture();
        assert!(!slot.is_ready());

        for i in 0..WINDOW {
            ingestor.push(i as f32);
        }
        assert!(slot.is_ready());

        let mut frame = vec![0.0; WINDOW];
        assert!(slot.take_into(&mut frame).unwrap());
        assert_eq!(frame[0], 0.0);
        assert_eq!(frame[WINDOW - 1], (WINDOW - 1) as f32);
        assert!(!slot.is_ready());
    }

    #[test]
    fn undrained_slot_keeps_the_newest_window() {
        let (mut ingestor, slot) = fixture();

        // Two full windows without a drain in between: the pending frame is
        // replaced, never queued, and pushing stays non-blocking throughout.
        ingestor.push_block(&[0.25; WINDOW]);
        ingestor.push_block(&[0.5; WINDOW]);

        let mut frame = vec![0.0; WINDOW];
        assert!(slot.take_into(&mut frame).unwrap());
        assert!(frame.iter().all(|&s| s == 0.5));

        // Exactly one frame existed; the slot is empty again.
        assert!(!slot.take_into(&mut frame).unwrap());
    }

    #[test]
    fn take_on_empty_slot_is_a_no_op() {
        let (_ingestor, slot) = fixture();
        let mut frame = vec![7.0; WINDOW];
        assert!(!slot.take_into(&mut frame).unwrap());
        assert!(frame.iter().all(|&s| s == 7.0));
    }

    #[test]
    fn mismatched_destination_is_rejected() {
        let (mut ingestor, slot) = fixture();
        ingestor.push_block(&[0.1; WINDOW]);

        let mut frame = vec![0.0; WINDOW / 2];
        assert!(slot.take_into(&mut frame).is_err());
    }
}
