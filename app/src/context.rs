//! Frame bookkeeping shared by the run loop and the systems.

use std::time::{Duration, Instant};

/// Resource describing the running application.
///
/// Registered by [`App`](crate::App) before the first tick; systems read it
/// to know the frame number or the time spent so far.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub(crate) frame_number: u64,
    pub(crate) max_frames: Option<u64>,
    pub(crate) start_time: Instant,
    pub(crate) last_frame: Instant,
    pub(crate) delta_time: Duration,
}

impl AppContext {
    pub fn new(max_frames: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            max_frames,
            start_time: now,
            last_frame: now,
            delta_time: Duration::ZERO,
        }
    }

    /// Frames completed so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    /// Duration of the previous frame.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Time since the application started.
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Counts a finished frame. Returns `true` once the frame limit is hit.
    pub(crate) fn finish_frame(&mut self) -> bool {
        let now = Instant::now();
        self.delta_time = now - self.last_frame;
        self.last_frame = now;
        self.frame_number += 1;
        self.max_frames
            .is_some_and(|max_frames| self.frame_number >= max_frames)
    }
}
