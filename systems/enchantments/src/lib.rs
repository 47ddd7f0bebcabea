#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-driven spawner for the short-lived collectibles scattered through a hall.

use rand::Rng;
use rune_hall_core::{
    CellCoord, CellOccupancy, EnchantmentId, EnchantmentKind, Event, GameTime, PixelPoint,
};
use rune_hall_world::{CollisionMap, Player};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration parameters required to construct the enchantment spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between spawn attempts.
    pub spawn_interval_secs: u64,
    /// Seconds an enchantment stays in the hall before vanishing.
    pub lifetime_secs: u64,
    /// Random cells drawn before a spawn attempt is abandoned.
    pub placement_attempts: usize,
    /// Seconds an extra-time enchantment adds to the clock.
    pub extra_time_secs: u64,
}

impl Config {
    /// Creates a new configuration from its parts.
    #[must_use]
    pub const fn new(
        spawn_interval_secs: u64,
        lifetime_secs: u64,
        placement_attempts: usize,
        extra_time_secs: u64,
    ) -> Self {
        Self {
            spawn_interval_secs,
            lifetime_secs,
            placement_attempts,
            extra_time_secs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(12, 6, 50, 5)
    }
}

/// Collectible lying on a hall tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Enchantment {
    id: EnchantmentId,
    kind: EnchantmentKind,
    cell: CellCoord,
    position: PixelPoint,
    spawn_time: GameTime,
    lifetime_secs: u64,
}

impl Enchantment {
    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> EnchantmentId {
        self.id
    }

    /// Kind of the enchantment.
    #[must_use]
    pub const fn kind(&self) -> EnchantmentKind {
        self.kind
    }

    /// Cell the enchantment occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Top-left pixel of the occupied cell.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// In-game time the enchantment appeared.
    #[must_use]
    pub const fn spawn_time(&self) -> GameTime {
        self.spawn_time
    }

    /// In-game time at which the enchantment vanishes.
    #[must_use]
    pub const fn expires_at(&self) -> GameTime {
        self.spawn_time.after(self.lifetime_secs)
    }

    /// Reports whether the enchantment is still present at `now`.
    #[must_use]
    pub fn is_live(&self, now: GameTime) -> bool {
        now >= self.spawn_time && now < self.expires_at()
    }

    /// Applies the enchantment's effect to the player.
    ///
    /// Extra lives and extra time take effect immediately; every other kind
    /// is stored in the inventory.
    pub fn collect(&self, player: &mut Player, extra_time_secs: u64, out: &mut Vec<Event>) {
        match self.kind {
            EnchantmentKind::ExtraLife => {
                let lives = player.gain_life();
                out.push(Event::LifeGained { lives });
            }
            EnchantmentKind::ExtraTime => {
                player.request_bonus_time(extra_time_secs);
                out.push(Event::BonusTimeRequested {
                    seconds: extra_time_secs,
                });
            }
            stored => player.inventory_mut().add(stored),
        }
        out.push(Event::EnchantmentCollected {
            id: self.id,
            kind: self.kind,
        });
    }
}

/// Spawns, expires and hands out enchantments for the active hall.
#[derive(Debug)]
pub struct EnchantmentSpawner {
    config: Config,
    enchantments: Vec<Enchantment>,
    last_spawn_time: GameTime,
    next_id: u32,
}

impl EnchantmentSpawner {
    /// Creates an empty spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            enchantments: Vec::new(),
            last_spawn_time: GameTime::ZERO,
            next_id: 0,
        }
    }

    /// Parameters the spawner was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one logic tick: expires stale enchantments, then spawns when due.
    ///
    /// The spawn timer restarts whenever a spawn is due, even if no free cell
    /// was found.
    pub fn tick<R>(&mut self, now: GameTime, map: &CollisionMap, rng: &mut R, out: &mut Vec<Event>)
    where
        R: Rng + ?Sized,
    {
        self.expire(now, out);

        if now.since(self.last_spawn_time) < self.config.spawn_interval_secs {
            return;
        }
        self.last_spawn_time = now;

        let attempts = self.config.placement_attempts;
        let Some(cell) = map.find_open_cell(rng, attempts, |cell| self.is_location_available(cell))
        else {
            debug!(attempts, "no free cell for enchantment");
            return;
        };

        let kind = EnchantmentKind::SPAWNABLE[rng.gen_range(0..EnchantmentKind::SPAWNABLE.len())];
        let id = EnchantmentId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.enchantments.push(Enchantment {
            id,
            kind,
            cell,
            position: cell.origin(map.tile_length()),
            spawn_time: now,
            lifetime_secs: self.config.lifetime_secs,
        });
        debug!(id = id.get(), ?kind, column = cell.column(), row = cell.row(), "enchantment spawned");
        out.push(Event::EnchantmentSpawned { id, kind, cell });
    }

    /// Collects the enchantment whose tile contains `click`, if any.
    ///
    /// Returns the kind that was collected.
    pub fn handle_click(
        &mut self,
        click: PixelPoint,
        tile_length: f32,
        player: &mut Player,
        out: &mut Vec<Event>,
    ) -> Option<EnchantmentKind> {
        let index = self
            .enchantments
            .iter()
            .position(|enchantment| enchantment.cell.bounds_contain(click, tile_length))?;
        let enchantment = self.enchantments.remove(index);
        enchantment.collect(player, self.config.extra_time_secs, out);
        debug!(id = enchantment.id.get(), kind = ?enchantment.kind, "enchantment collected");
        Some(enchantment.kind)
    }

    /// Reports whether no live enchantment occupies `cell`.
    #[must_use]
    pub fn is_location_available(&self, cell: CellCoord) -> bool {
        !self
            .enchantments
            .iter()
            .any(|enchantment| enchantment.cell == cell)
    }

    /// Enchantments currently lying in the hall.
    #[must_use]
    pub fn enchantments(&self) -> &[Enchantment] {
        &self.enchantments
    }

    /// In-game time of the last due spawn attempt.
    #[must_use]
    pub const fn last_spawn_time(&self) -> GameTime {
        self.last_spawn_time
    }

    /// Drops every enchantment and restarts the spawn timer, for hall changes.
    pub fn clear(&mut self) {
        self.enchantments.clear();
        self.last_spawn_time = GameTime::ZERO;
    }

    fn expire(&mut self, now: GameTime, out: &mut Vec<Event>) {
        self.enchantments.retain(|enchantment| {
            if enchantment.is_live(now) {
                return true;
            }
            out.push(Event::EnchantmentExpired {
                id: enchantment.id,
                kind: enchantment.kind,
            });
            false
        });
    }
}

impl CellOccupancy for EnchantmentSpawner {
    fn is_location_available(&self, cell: CellCoord) -> bool {
        EnchantmentSpawner::is_location_available(self, cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lying(kind: EnchantmentKind, cell: CellCoord) -> Enchantment {
        Enchantment {
            id: EnchantmentId::new(7),
            kind,
            cell,
            position: cell.origin(10.0),
            spawn_time: GameTime::from_secs(4),
            lifetime_secs: 6,
        }
    }

    #[test]
    fn occupied_cells_are_unavailable() {
        let mut spawner = EnchantmentSpawner::new(Config::default());
        spawner
            .enchantments
            .push(lying(EnchantmentKind::Cloak, CellCoord::new(2, 3)));
        assert!(!spawner.is_location_available(CellCoord::new(2, 3)));
        assert!(spawner.is_location_available(CellCoord::new(3, 2)));
        let occupancy: &dyn CellOccupancy = &spawner;
        assert!(!occupancy.is_location_available(CellCoord::new(2, 3)));
    }

    #[test]
    fn extra_life_applies_immediately() {
        let mut spawner = EnchantmentSpawner::new(Config::default());
        spawner
            .enchantments
            .push(lying(EnchantmentKind::ExtraLife, CellCoord::new(1, 1)));
        let mut player = Player::new(PixelPoint::new(0.0, 0.0), 2);
        let mut events = Vec::new();

        let collected =
            spawner.handle_click(PixelPoint::new(14.0, 19.0), 10.0, &mut player, &mut events);

        assert_eq!(collected, Some(EnchantmentKind::ExtraLife));
        assert_eq!(player.lives(), 3);
        assert!(spawner.enchantments().is_empty());
        assert_eq!(
            events,
            vec![
                Event::LifeGained { lives: 3 },
                Event::EnchantmentCollected {
                    id: EnchantmentId::new(7),
                    kind: EnchantmentKind::ExtraLife,
                },
            ]
        );
    }

    #[test]
    fn extra_time_requests_bonus_seconds() {
        let mut spawner = EnchantmentSpawner::new(Config::default());
        spawner
            .enchantments
            .push(lying(EnchantmentKind::ExtraTime, CellCoord::new(0, 0)));
        let mut player = Player::new(PixelPoint::new(0.0, 0.0), 3);
        let mut events = Vec::new();

        let _ = spawner.handle_click(PixelPoint::new(5.0, 5.0), 10.0, &mut player, &mut events);

        assert_eq!(player.take_bonus_time(), 5);
        assert!(events.contains(&Event::BonusTimeRequested { seconds: 5 }));
    }

    #[test]
    fn stored_kinds_go_to_the_inventory() {
        let mut spawner = EnchantmentSpawner::new(Config::default());
        spawner
            .enchantments
            .push(lying(EnchantmentKind::LuringGem, CellCoord::new(0, 0)));
        let mut player = Player::new(PixelPoint::new(0.0, 0.0), 3);
        let mut events = Vec::new();

        let _ = spawner.handle_click(PixelPoint::new(1.0, 1.0), 10.0, &mut player, &mut events);

        assert_eq!(player.inventory().count(EnchantmentKind::LuringGem), 1);
        assert_eq!(player.lives(), 3);
    }

    #[test]
    fn clicks_outside_every_tile_collect_nothing() {
        let mut spawner = EnchantmentSpawner::new(Config::default());
        spawner
            .enchantments
            .push(lying(EnchantmentKind::Reveal, CellCoord::new(0, 0)));
        let mut player = Player::new(PixelPoint::new(0.0, 0.0), 3);
        let mut events = Vec::new();

        let collected =
            spawner.handle_click(PixelPoint::new(25.0, 5.0), 10.0, &mut player, &mut events);

        assert_eq!(collected, None);
        assert_eq!(spawner.enchantments().len(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn liveness_window_is_half_open() {
        let enchantment = lying(EnchantmentKind::Cloak, CellCoord::new(0, 0));
        assert!(!enchantment.is_live(GameTime::from_secs(3)));
        assert!(enchantment.is_live(GameTime::from_secs(4)));
        assert!(enchantment.is_live(GameTime::from_secs(9)));
        assert!(!enchantment.is_live(GameTime::from_secs(10)));
    }
}
