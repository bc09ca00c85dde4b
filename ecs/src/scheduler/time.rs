use std::time::Instant;

use super::{Scheduler, SystemSet};

const DEFAULT_TICK_RATE: f32 = 1.0 / 50.0;
const REMAINDER_THRESHOLD: f32 = 0.0001;

/// Runs its groups zero or more times per tick to keep a fixed step.
///
/// Elapsed wall time accumulates; every whole `tick_rate` seconds in the
/// accumulator is one pass. The leftover carries into the next tick.
pub struct FixedTimeUpdate {
    systems: SystemSet,
    tick_rate: f32,
    accumulator: f32,
    last_time: Instant,
}

impl FixedTimeUpdate {
    /// `tick_rate` is the step in seconds.
    pub fn new(tick_rate: f32) -> Self {
        Self {
            systems: SystemSet::new(),
            tick_rate: sanitize_rate(tick_rate, DEFAULT_TICK_RATE),
            accumulator: 0.0,
            last_time: Instant::now(),
        }
    }

    pub fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    /// Changes the step. Non-positive or non-finite values are ignored.
    pub fn set_tick_rate(&mut self, tick_rate: f32) {
        self.tick_rate = sanitize_rate(tick_rate, self.tick_rate);
    }

    /// Time left in the accumulator, always below one step.
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Adds `elapsed` seconds and returns the number of whole steps due.
    pub fn accumulate(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.max(0.0);
        let steps = (self.accumulator / self.tick_rate).floor();
        self.accumulator -= steps * self.tick_rate;
        steps as u32
    }
}

impl Default for FixedTimeUpdate {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl Scheduler for FixedTimeUpdate {
    fn systems(&self) -> &SystemSet {
        &self.systems
    }

    fn systems_mut(&mut self) -> &mut SystemSet {
        &mut self.systems
    }

    fn begin_tick(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_time).as_secs_f32();
        self.last_time = now;
        self.accumulate(elapsed)
    }
}

/// Runs its groups with a delta time that tracks the wall clock.
///
/// A tick shorter than the target rate runs once with the measured delta.
/// A longer tick is split into whole target-rate passes plus one remainder
/// pass (when the remainder exceeds a tenth of a millisecond). Systems read
/// the delta of the current pass with [`current_delta_time`](Self::current_delta_time).
pub struct RelativeTimeUpdate {
    systems: SystemSet,
    target_tick_rate: f32,
    delta_time: f32,
    planned: Vec<f32>,
    last_time: Instant,
}

impl RelativeTimeUpdate {
    pub fn new(target_tick_rate: f32) -> Self {
        Self {
            systems: SystemSet::new(),
            target_tick_rate: sanitize_rate(target_tick_rate, DEFAULT_TICK_RATE),
            delta_time: 0.0,
            planned: Vec::new(),
            last_time: Instant::now(),
        }
    }

    pub fn target_tick_rate(&self) -> f32 {
        self.target_tick_rate
    }

    /// Non-positive or non-finite values are ignored.
    pub fn set_target_tick_rate(&mut self, target_tick_rate: f32) {
        self.target_tick_rate = sanitize_rate(target_tick_rate, self.target_tick_rate);
    }

    /// Delta of the pass currently running (or of the last one).
    pub fn current_delta_time(&self) -> f32 {
        self.delta_time
    }

    /// The per-pass deltas for a tick that lasted `elapsed` seconds.
    pub fn plan(&self, elapsed: f32) -> Vec<f32> {
        let elapsed = elapsed.max(0.0);
        if elapsed < self.target_tick_rate {
            return vec![elapsed];
        }
        let steps = (elapsed / self.target_tick_rate).floor();
        let remainder = elapsed - steps * self.target_tick_rate;
        let mut deltas = vec![self.target_tick_rate; steps as usize];
        if remainder > REMAINDER_THRESHOLD {
            deltas.push(remainder);
        }
        deltas
    }

    /// Plans the passes for `elapsed` seconds, as `begin_tick` does with the
    /// wall clock.
    pub fn prepare(&mut self, elapsed: f32) -> u32 {
        self.planned = self.plan(elapsed);
        self.planned.len() as u32
    }
}

impl Default for RelativeTimeUpdate {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl Scheduler for RelativeTimeUpdate {
    fn systems(&self) -> &SystemSet {
        &self.systems
    }

    fn systems_mut(&mut self) -> &mut SystemSet {
        &mut self.systems
    }

    fn begin_tick(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_time).as_secs_f32();
        self.last_time = now;
        self.prepare(elapsed)
    }

    fn begin_pass(&mut self, pass: u32) {
        if let Some(&delta) = self.planned.get(pass as usize) {
            self.delta_time = delta;
        }
    }
}

fn sanitize_rate(rate: f32, fallback: f32) -> f32 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        log::warn!("Ignoring invalid tick rate {rate}, keeping {fallback}");
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_default_rate() {
        let fixed = FixedTimeUpdate::default();
        assert!((fixed.tick_rate() - 0.02).abs() < f32::EPSILON);
    }

    #[test]
    fn fixed_accumulates_whole_steps() {
        let mut fixed = FixedTimeUpdate::new(0.5);
        assert_eq!(fixed.accumulate(0.25), 0);
        assert_eq!(fixed.accumulate(0.5), 1);
        assert!((fixed.accumulator() - 0.25).abs() < 1e-6);
        assert_eq!(fixed.accumulate(1.25), 3);
        assert!(fixed.accumulator() < 1e-6);
    }

    #[test]
    fn fixed_rejects_invalid_rate() {
        let mut fixed = FixedTimeUpdate::new(0.5);
        fixed.set_tick_rate(0.0);
        fixed.set_tick_rate(f32::NAN);
        assert_eq!(fixed.tick_rate(), 0.5);
        fixed.set_tick_rate(0.25);
        assert_eq!(fixed.tick_rate(), 0.25);
    }

    #[test]
    fn relative_short_tick_runs_once() {
        let relative = RelativeTimeUpdate::new(0.25);
        assert_eq!(relative.plan(0.125), vec![0.125]);
    }

    #[test]
    fn relative_long_tick_substeps_with_remainder() {
        let relative = RelativeTimeUpdate::new(0.25);
        assert_eq!(relative.plan(0.625), vec![0.25, 0.25, 0.125]);
    }

    #[test]
    fn relative_tiny_remainder_is_dropped() {
        let relative = RelativeTimeUpdate::new(0.25);
        assert_eq!(relative.plan(0.5), vec![0.25, 0.25]);
    }

    #[test]
    fn relative_pass_sets_delta() {
        let mut relative = RelativeTimeUpdate::new(0.25);
        assert_eq!(relative.prepare(0.625), 3);
        relative.begin_pass(0);
        assert_eq!(relative.current_delta_time(), 0.25);
        relative.begin_pass(2);
        assert_eq!(relative.current_delta_time(), 0.125);
    }
}
