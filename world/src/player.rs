//! The slice of player state the hall simulation reads and mutates.

use std::collections::BTreeMap;

use rune_hall_core::{EnchantmentKind, Event, GameTime, PixelPoint};

/// Multiset of enchantments the player carries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<EnchantmentKind, u32>,
}

impl Inventory {
    /// Adds one enchantment of `kind`.
    pub fn add(&mut self, kind: EnchantmentKind) {
        let count = self.items.entry(kind).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Removes one enchantment of `kind`, returning `false` when none is held.
    pub fn take(&mut self, kind: EnchantmentKind) -> bool {
        match self.items.get_mut(&kind) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                let _ = self.items.remove(&kind);
                true
            }
            None => false,
        }
    }

    /// Number of enchantments of `kind` held.
    #[must_use]
    pub fn count(&self, kind: EnchantmentKind) -> u32 {
        self.items.get(&kind).copied().unwrap_or(0)
    }

    /// Reports whether at least one enchantment of `kind` is held.
    #[must_use]
    pub fn contains(&self, kind: EnchantmentKind) -> bool {
        self.count(kind) > 0
    }

    /// Iterator over held kinds and their counts, in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (EnchantmentKind, u32)> + '_ {
        self.items.iter().map(|(kind, count)| (*kind, *count))
    }
}

/// Player state consumed by monsters, enchantments and the rune registry.
#[derive(Clone, Debug)]
pub struct Player {
    position: PixelPoint,
    lives: u32,
    cloak_until: Option<GameTime>,
    reveal_until: Option<GameTime>,
    inventory: Inventory,
    bonus_time_secs: u64,
}

impl Player {
    /// Creates a player at `position` with the provided number of lives.
    #[must_use]
    pub fn new(position: PixelPoint, lives: u32) -> Self {
        Self {
            position,
            lives,
            cloak_until: None,
            reveal_until: None,
            inventory: Inventory::default(),
            bonus_time_secs: 0,
        }
    }

    /// Current position in pixels.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Moves the player. Movement physics live outside the simulation core.
    pub fn set_position(&mut self, position: PixelPoint) {
        self.position = position;
    }

    /// Lives remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Reports whether the player has lives left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Removes one life and returns the lives remaining.
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    /// Adds one life and returns the new total.
    pub fn gain_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_add(1);
        self.lives
    }

    /// Reports whether the cloak buff is active.
    #[must_use]
    pub const fn is_cloaked(&self) -> bool {
        self.cloak_until.is_some()
    }

    /// Reports whether the reveal buff is active.
    #[must_use]
    pub const fn is_revealing(&self) -> bool {
        self.reveal_until.is_some()
    }

    /// Activates the cloak buff until `until`.
    pub fn activate_cloak(&mut self, until: GameTime) {
        self.cloak_until = Some(until);
    }

    /// Activates the reveal buff until `until`.
    pub fn activate_reveal(&mut self, until: GameTime) {
        self.reveal_until = Some(until);
    }

    /// Drops buffs whose deadline has been reached.
    pub fn expire_buffs(&mut self, now: GameTime, out: &mut Vec<Event>) {
        if self.cloak_until.is_some_and(|until| now >= until) {
            self.cloak_until = None;
            out.push(Event::BuffExpired {
                kind: EnchantmentKind::Cloak,
            });
        }
        if self.reveal_until.is_some_and(|until| now >= until) {
            self.reveal_until = None;
            out.push(Event::BuffExpired {
                kind: EnchantmentKind::Reveal,
            });
        }
    }

    /// Held enchantments.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Mutable access to the held enchantments.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Reports whether the player carries the hall's rune.
    #[must_use]
    pub fn holds_rune(&self) -> bool {
        self.inventory.contains(EnchantmentKind::Rune)
    }

    /// Queues bonus seconds for the hall clock.
    pub fn request_bonus_time(&mut self, seconds: u64) {
        self.bonus_time_secs = self.bonus_time_secs.saturating_add(seconds);
    }

    /// Drains queued bonus seconds.
    pub fn take_bonus_time(&mut self) -> u64 {
        std::mem::take(&mut self.bonus_time_secs)
    }

    /// Clears per-hall state while keeping lives and position.
    pub fn reset_for_hall(&mut self) {
        self.cloak_until = None;
        self.reveal_until = None;
        self.bonus_time_secs = 0;
        let _ = self.inventory.take(EnchantmentKind::Rune);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_counts_duplicates() {
        let mut inventory = Inventory::default();
        inventory.add(EnchantmentKind::Cloak);
        inventory.add(EnchantmentKind::Cloak);
        assert_eq!(inventory.count(EnchantmentKind::Cloak), 2);
        assert!(inventory.take(EnchantmentKind::Cloak));
        assert!(inventory.take(EnchantmentKind::Cloak));
        assert!(!inventory.take(EnchantmentKind::Cloak));
        assert_eq!(inventory.iter().count(), 0);
    }

    #[test]
    fn lives_never_underflow() {
        let mut player = Player::new(PixelPoint::default(), 1);
        assert_eq!(player.lose_life(), 0);
        assert_eq!(player.lose_life(), 0);
        assert!(!player.is_alive());
    }

    #[test]
    fn buffs_expire_at_their_deadline() {
        let mut player = Player::new(PixelPoint::default(), 3);
        player.activate_cloak(GameTime::from_secs(5));
        let mut events = Vec::new();
        player.expire_buffs(GameTime::from_secs(4), &mut events);
        assert!(player.is_cloaked());
        assert!(events.is_empty());
        player.expire_buffs(GameTime::from_secs(5), &mut events);
        assert!(!player.is_cloaked());
        assert_eq!(
            events,
            vec![Event::BuffExpired {
                kind: EnchantmentKind::Cloak
            }]
        );
    }

    #[test]
    fn bonus_time_drains_once() {
        let mut player = Player::new(PixelPoint::default(), 3);
        player.request_bonus_time(5);
        player.request_bonus_time(5);
        assert_eq!(player.take_bonus_time(), 10);
        assert_eq!(player.take_bonus_time(), 0);
    }
}
