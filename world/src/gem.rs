//! Single-slot storage for the thrown luring gem.

use rune_hall_core::{GameTime, PixelPoint};

/// A luring gem lying in the hall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LuringGem {
    position: PixelPoint,
    spawn_time: GameTime,
}

impl LuringGem {
    /// Where the gem landed.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// In-game time the gem landed.
    #[must_use]
    pub const fn spawn_time(&self) -> GameTime {
        self.spawn_time
    }
}

/// Holds at most one luring gem and expires it after a fixed lifetime.
///
/// The slot overwrites on [`LuringGemSlot::place`]; callers reject throws
/// while a gem is active.
#[derive(Clone, Debug)]
pub struct LuringGemSlot {
    gem: Option<LuringGem>,
    lifetime_secs: u64,
}

impl LuringGemSlot {
    /// Creates an empty slot whose gems last `lifetime_secs`.
    #[must_use]
    pub const fn new(lifetime_secs: u64) -> Self {
        Self {
            gem: None,
            lifetime_secs,
        }
    }

    /// Places a gem at `position`.
    pub fn place(&mut self, position: PixelPoint, now: GameTime) {
        self.gem = Some(LuringGem {
            position,
            spawn_time: now,
        });
    }

    /// Gem currently in the hall, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&LuringGem> {
        self.gem.as_ref()
    }

    /// Reports whether a gem is in the hall.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.gem.is_some()
    }

    /// Removes the gem, returning it if one was present.
    pub fn clear(&mut self) -> Option<LuringGem> {
        self.gem.take()
    }

    /// Removes the gem once its lifetime has elapsed. Returns `true` on removal.
    pub fn expire(&mut self, now: GameTime) -> bool {
        let expired = self
            .gem
            .is_some_and(|gem| now.since(gem.spawn_time) >= self.lifetime_secs);
        if expired {
            self.gem = None;
        }
        expired
    }
}
