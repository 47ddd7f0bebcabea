#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative hall state for Rune Hall.
//!
//! The [`World`] owns the collision map, the build-object registry, the
//! player and the luring gem slot. Player intents flow in through [`apply`];
//! read access goes through the [`query`] module. Tick-driven systems borrow
//! the pieces they need through [`World::parts_mut`].

mod build_objects;
mod collision;
mod gem;
mod player;

use rand::Rng;
use rune_hall_core::{
    CellCoord, Command, EnchantmentKind, Event, GameTime, GemClearReason, HallName, PixelPoint,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use build_objects::{
    BuildObject, BuildObjectRegistry, ClickOutcome, InvariantViolation, LoadReport,
    RegistryError, RuneRelocator, RuneTransfer, ACKNOWLEDGEMENT_SECS, INTERACTION_REACH_TILES,
    TRANSFER_ATTEMPTS,
};
pub use collision::{CollisionMap, LayoutError, Tile};
pub use gem::{LuringGem, LuringGemSlot};
pub use player::{Inventory, Player};

/// Tunable parameters for the player-facing parts of a hall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Lives the player starts a run with.
    pub starting_lives: u32,
    /// Seconds a thrown luring gem stays in the hall.
    pub gem_lifetime_secs: u64,
    /// Distance, in tiles, a luring gem travels when thrown.
    pub gem_throw_tiles: u32,
    /// Seconds a cloak keeps archers from hitting the player.
    pub cloak_secs: u64,
    /// Seconds a reveal keeps the rune's neighbourhood highlighted.
    pub reveal_secs: u64,
    /// Side length, in tiles, of the square highlighted by a reveal.
    pub reveal_span: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            gem_lifetime_secs: 10,
            gem_throw_tiles: 5,
            cloak_secs: 20,
            reveal_secs: 10,
            reveal_span: 4,
        }
    }
}

/// Represents the authoritative state of the hall being played.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    map: CollisionMap,
    objects: BuildObjectRegistry,
    player: Player,
    gem: LuringGemSlot,
    now: GameTime,
}

/// Simultaneous mutable borrows of the world's components.
#[derive(Debug)]
pub struct HallParts<'a> {
    /// Collision map of the active hall.
    pub map: &'a mut CollisionMap,
    /// Build objects of every hall.
    pub objects: &'a mut BuildObjectRegistry,
    /// The player.
    pub player: &'a mut Player,
    /// The luring gem slot.
    pub gem: &'a mut LuringGemSlot,
}

impl World {
    /// Creates a world for the first hall laid out on `map`.
    ///
    /// The player starts on the first walkable cell in row-major order.
    #[must_use]
    pub fn new(map: CollisionMap, config: WorldConfig) -> Self {
        let start = spawn_point(&map);
        Self {
            player: Player::new(start, config.starting_lives),
            gem: LuringGemSlot::new(config.gem_lifetime_secs),
            objects: BuildObjectRegistry::new(),
            now: GameTime::ZERO,
            map,
            config,
        }
    }

    /// Borrows every component mutably at once.
    pub fn parts_mut(&mut self) -> HallParts<'_> {
        HallParts {
            map: &mut self.map,
            objects: &mut self.objects,
            player: &mut self.player,
            gem: &mut self.gem,
        }
    }

    /// Mutable access to the build-object registry, for world loading and build mode.
    pub fn objects_mut(&mut self) -> &mut BuildObjectRegistry {
        &mut self.objects
    }

    /// Mutable access to the player.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Restarts in-game time at zero and drops timed player state.
    ///
    /// Used when the world is reloaded in place; lives and position stay.
    pub fn restart_timeline(&mut self) {
        self.now = GameTime::ZERO;
        self.player.reset_for_hall();
    }

    /// Switches to `hall` laid out on `map` and hides the rune in it.
    ///
    /// Timed player state and any lying gem are dropped; lives and stored
    /// enchantments other than the previous rune carry over.
    pub fn enter_hall<R>(
        &mut self,
        hall: HallName,
        map: CollisionMap,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        if self.gem.clear().is_some() {
            out.push(Event::GemCleared {
                reason: GemClearReason::HallExited,
            });
        }
        self.player.reset_for_hall();
        self.player.set_position(spawn_point(&map));
        self.map = map;
        self.now = GameTime::ZERO;
        self.objects.set_active_hall(hall);
        if let Some(holder) = self.objects.assign_random_rune(rng) {
            out.push(Event::RunePlaced { holder });
        }
        debug!(%hall, holder = ?self.objects.rune_holder(), "entered hall");
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AdvanceTo { now } => {
            world.now = now;
            world.player.expire_buffs(now, out_events);
            if world.gem.expire(now) {
                out_events.push(Event::GemCleared {
                    reason: GemClearReason::Expired,
                });
            }
        }
        Command::MovePlayer { to } => world.player.set_position(to),
        Command::UseReveal => {
            if world.player.inventory_mut().take(EnchantmentKind::Reveal) {
                let until = world.now.after(world.config.reveal_secs);
                world.player.activate_reveal(until);
                out_events.push(Event::BuffActivated {
                    kind: EnchantmentKind::Reveal,
                    until,
                });
            } else {
                out_events.push(Event::AbilityRejected {
                    kind: EnchantmentKind::Reveal,
                });
            }
        }
        Command::UseCloak => {
            if world.player.inventory_mut().take(EnchantmentKind::Cloak) {
                let until = world.now.after(world.config.cloak_secs);
                world.player.activate_cloak(until);
                out_events.push(Event::BuffActivated {
                    kind: EnchantmentKind::Cloak,
                    until,
                });
            } else {
                out_events.push(Event::AbilityRejected {
                    kind: EnchantmentKind::Cloak,
                });
            }
        }
        Command::ThrowGem { direction } => {
            // Only one gem may lie in the hall; the slot itself would overwrite.
            if world.gem.is_active()
                || !world.player.inventory_mut().take(EnchantmentKind::LuringGem)
            {
                out_events.push(Event::AbilityRejected {
                    kind: EnchantmentKind::LuringGem,
                });
                return;
            }
            let (dx, dy) = direction.unit();
            let reach = world.config.gem_throw_tiles as f32 * world.map.tile_length();
            let at = world.player.position().offset(dx * reach, dy * reach);
            world.gem.place(at, world.now);
            debug!(?direction, x = at.x, y = at.y, "luring gem thrown");
            out_events.push(Event::GemThrown { at });
        }
    }
}

fn spawn_point(map: &CollisionMap) -> PixelPoint {
    map.cells()
        .find(|cell| !map.is_cell_collidable(*cell))
        .unwrap_or(CellCoord::new(0, 0))
        .center(map.tile_length())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use rune_hall_core::{CellCoord, CellRect, CellRectSize, GameTime, HallName, ObjectId};

    use super::{BuildObjectRegistry, CollisionMap, LuringGem, Player, World, WorldConfig};

    /// Hall currently being played.
    #[must_use]
    pub fn hall(world: &World) -> HallName {
        world.objects.active_hall()
    }

    /// In-game time last reported to the world.
    #[must_use]
    pub fn now(world: &World) -> GameTime {
        world.now
    }

    /// Parameters the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Collision map of the active hall.
    #[must_use]
    pub fn collision_map(world: &World) -> &CollisionMap {
        &world.map
    }

    /// Build objects of every hall.
    #[must_use]
    pub fn objects(world: &World) -> &BuildObjectRegistry {
        &world.objects
    }

    /// The player.
    #[must_use]
    pub fn player(world: &World) -> &Player {
        &world.player
    }

    /// Cell the player stands on, if inside the grid.
    #[must_use]
    pub fn player_cell(world: &World) -> Option<CellCoord> {
        world.map.cell_at(world.player.position())
    }

    /// Luring gem lying in the hall, if any.
    #[must_use]
    pub fn gem(world: &World) -> Option<&LuringGem> {
        world.gem.current()
    }

    /// Object hiding the rune, if it has not been collected.
    #[must_use]
    pub fn rune_holder(world: &World) -> Option<ObjectId> {
        world.objects.rune_holder()
    }

    /// Object highlighted after a rune-free click, if still showing.
    #[must_use]
    pub fn acknowledged_object(world: &World) -> Option<ObjectId> {
        world.objects.acknowledged(world.now)
    }

    /// Square of cells highlighted by an active reveal.
    ///
    /// The square always contains the rune holder and is clamped to the grid.
    #[must_use]
    pub fn reveal_region(world: &World) -> Option<CellRect> {
        if !world.player.is_revealing() {
            return None;
        }
        let holder = world.objects.rune_holder()?;
        if holder.hall() != world.objects.active_hall() {
            return None;
        }
        let cell = world.objects.object(holder)?.cell();
        let width = world.config.reveal_span.min(world.map.columns()).max(1);
        let height = world.config.reveal_span.min(world.map.rows()).max(1);
        let column = cell
            .column()
            .saturating_sub(1)
            .min(world.map.columns().saturating_sub(width));
        let row = cell
            .row()
            .saturating_sub(1)
            .min(world.map.rows().saturating_sub(height));
        Some(CellRect::from_origin_and_size(
            CellCoord::new(column, row),
            CellRectSize::new(width, height),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rune_hall_core::{Direction, ObjectId};

    fn world() -> World {
        World::new(CollisionMap::walled(12, 12, 10.0), WorldConfig::default())
    }

    #[test]
    fn player_starts_on_first_walkable_cell() {
        let world = world();
        assert_eq!(query::player_cell(&world), Some(CellCoord::new(1, 1)));
        assert_eq!(query::player(&world).lives(), 3);
    }

    #[test]
    fn cloak_requires_inventory_item() {
        let mut world = world();
        let mut events = Vec::new();
        apply(&mut world, Command::UseCloak, &mut events);
        assert_eq!(
            events,
            vec![Event::AbilityRejected {
                kind: EnchantmentKind::Cloak
            }]
        );
        assert!(!query::player(&world).is_cloaked());

        world.player_mut().inventory_mut().add(EnchantmentKind::Cloak);
        events.clear();
        apply(&mut world, Command::UseCloak, &mut events);
        assert!(query::player(&world).is_cloaked());
        assert_eq!(
            events,
            vec![Event::BuffActivated {
                kind: EnchantmentKind::Cloak,
                until: GameTime::from_secs(20),
            }]
        );
    }

    #[test]
    fn thrown_gem_lands_five_tiles_away_and_expires() {
        let mut world = world();
        world.player_mut().set_position(PixelPoint::new(15.0, 15.0));
        world.player_mut().inventory_mut().add(EnchantmentKind::LuringGem);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ThrowGem {
                direction: Direction::East,
            },
            &mut events,
        );
        let gem = query::gem(&world).copied().expect("gem thrown");
        assert_eq!(gem.position(), PixelPoint::new(65.0, 15.0));
        assert_eq!(
            query::player(&world)
                .inventory()
                .count(EnchantmentKind::LuringGem),
            0
        );

        events.clear();
        apply(
            &mut world,
            Command::AdvanceTo {
                now: GameTime::from_secs(10),
            },
            &mut events,
        );
        assert!(query::gem(&world).is_none());
        assert_eq!(
            events,
            vec![Event::GemCleared {
                reason: GemClearReason::Expired
            }]
        );
    }

    #[test]
    fn second_throw_is_rejected_while_gem_lies() {
        let mut world = world();
        world.player_mut().inventory_mut().add(EnchantmentKind::LuringGem);
        world.player_mut().inventory_mut().add(EnchantmentKind::LuringGem);
        let mut events = Vec::new();
        let throw = Command::ThrowGem {
            direction: Direction::South,
        };
        apply(&mut world, throw.clone(), &mut events);
        events.clear();
        apply(&mut world, throw, &mut events);
        assert_eq!(
            events,
            vec![Event::AbilityRejected {
                kind: EnchantmentKind::LuringGem
            }]
        );
        assert_eq!(
            query::player(&world)
                .inventory()
                .count(EnchantmentKind::LuringGem),
            1
        );
    }

    #[test]
    fn reveal_region_contains_the_rune_and_fits_the_grid() {
        let mut world = world();
        let holder = world
            .objects_mut()
            .add_object(HallName::Earth, BuildObject::new(11, 0, "chest"));
        assert!(world.objects_mut().set_rune(holder));
        world.player_mut().inventory_mut().add(EnchantmentKind::Reveal);
        let mut events = Vec::new();
        apply(&mut world, Command::UseReveal, &mut events);

        let region = query::reveal_region(&world).expect("reveal active");
        assert!(region.contains(CellCoord::new(11, 0)));
        assert_eq!(region.origin(), CellCoord::new(8, 0));
        assert_eq!(region.size().width(), 4);
    }

    #[test]
    fn restarting_the_timeline_rewinds_time_and_drops_buffs() {
        let mut world = world();
        world.player_mut().inventory_mut().add(EnchantmentKind::Cloak);
        world.player_mut().inventory_mut().add(EnchantmentKind::Rune);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AdvanceTo {
                now: GameTime::from_secs(40),
            },
            &mut events,
        );
        apply(&mut world, Command::UseCloak, &mut events);
        assert!(query::player(&world).is_cloaked());

        world.restart_timeline();

        assert_eq!(query::now(&world), GameTime::ZERO);
        assert!(!query::player(&world).is_cloaked());
        assert!(!query::player(&world).holds_rune());
        assert_eq!(query::player(&world).lives(), 3);
    }

    #[test]
    fn entering_a_hall_hides_the_rune_there() {
        let mut world = world();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let _ = world
            .objects_mut()
            .add_object(HallName::Air, BuildObject::new(2, 2, "vase"));
        let mut events = Vec::new();
        world.enter_hall(
            HallName::Air,
            CollisionMap::walled(8, 8, 10.0),
            &mut rng,
            &mut events,
        );
        assert_eq!(query::hall(&world), HallName::Air);
        assert_eq!(
            query::rune_holder(&world),
            Some(ObjectId::new(HallName::Air, 0))
        );
        assert_eq!(
            events,
            vec![Event::RunePlaced {
                holder: ObjectId::new(HallName::Air, 0)
            }]
        );
    }
}
