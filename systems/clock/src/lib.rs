#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pausable whole-second game clock that drives the hall's logic ticks.

use std::time::Duration;

use rune_hall_core::{ClockReading, Event, GameTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

const TICK_LENGTH: Duration = Duration::from_secs(1);

/// Configuration parameters that size a hall's time budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds granted per placed build object.
    pub seconds_per_object: u64,
    /// Budget floor applied to sparsely furnished halls.
    pub minimum_secs: u64,
}

impl Config {
    /// Creates a new configuration from its parts.
    #[must_use]
    pub const fn new(seconds_per_object: u64, minimum_secs: u64) -> Self {
        Self {
            seconds_per_object,
            minimum_secs,
        }
    }

    /// Time budget for a hall furnished with `objects` build objects.
    #[must_use]
    pub fn budget_for(&self, objects: usize) -> u64 {
        let objects = u64::try_from(objects).unwrap_or(u64::MAX);
        objects
            .saturating_mul(self.seconds_per_object)
            .max(self.minimum_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(5, 30)
    }
}

/// Game clock converting frame time into whole-second ticks.
///
/// Each tick advances in-game time by one second and consumes one second of
/// the hall's remaining budget. Ticks stop once the budget is spent.
#[derive(Debug)]
pub struct GameClock {
    initial_secs: u64,
    remaining_secs: u64,
    now: GameTime,
    accumulator: Duration,
    paused: bool,
}

impl GameClock {
    /// Creates a running clock with `initial_secs` on it.
    #[must_use]
    pub const fn new(initial_secs: u64) -> Self {
        Self {
            initial_secs,
            remaining_secs: initial_secs,
            now: GameTime::ZERO,
            accumulator: Duration::ZERO,
            paused: false,
        }
    }

    /// Restarts the clock for a new hall.
    pub fn reset(&mut self, initial_secs: u64) {
        *self = Self::new(initial_secs);
    }

    /// Feeds elapsed frame time into the clock and emits one event per tick.
    ///
    /// Returns the number of ticks fired. A paused or exhausted clock fires
    /// nothing and discards the time.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) -> usize {
        if self.paused || self.remaining_secs == 0 {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut fired = 0;
        while self.accumulator >= TICK_LENGTH && self.remaining_secs > 0 {
            self.accumulator -= TICK_LENGTH;
            self.now = self.now.after(1);
            self.remaining_secs -= 1;
            fired += 1;
            out.push(Event::ClockTicked {
                now: self.now,
                remaining_secs: self.remaining_secs,
            });
        }
        if self.remaining_secs == 0 {
            self.accumulator = Duration::ZERO;
        }
        fired
    }

    /// Stops tick emission, preserving the remaining time.
    pub fn pause(&mut self, out: &mut Vec<Event>) {
        if !self.paused {
            self.paused = true;
            out.push(Event::ClockPaused);
        }
    }

    /// Continues from the preserved remaining time.
    pub fn resume(&mut self, out: &mut Vec<Event>) {
        if self.paused {
            self.paused = false;
            out.push(Event::ClockResumed);
        }
    }

    /// Adds bonus seconds to the remaining time.
    pub fn add_time(&mut self, seconds: u64, out: &mut Vec<Event>) {
        if seconds == 0 {
            return;
        }
        self.remaining_secs = self.remaining_secs.saturating_add(seconds);
        debug!(seconds, remaining = self.remaining_secs, "time added");
        out.push(Event::TimeAdded { seconds });
    }

    /// Reports whether tick emission is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reports whether the hall's time budget is spent.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// Current in-game time.
    #[must_use]
    pub const fn now(&self) -> GameTime {
        self.now
    }

    /// Snapshot handed to systems on each tick.
    #[must_use]
    pub const fn reading(&self) -> ClockReading {
        ClockReading::new(self.now, self.remaining_secs, self.initial_secs)
    }
}
