//! Timer-driven monster placement.

use rand::{Rng, RngCore};
use rune_hall_core::{CellCoord, Event, GameTime, MonsterId, MonsterKind};
use rune_hall_world::CollisionMap;
use tracing::debug;

use crate::{ai::MonsterAi, monster::Monster, Config, MonsterContext};

/// Adds a random monster to the hall every spawn interval.
#[derive(Debug)]
pub struct MonsterSpawner {
    config: Config,
    last_spawn_time: GameTime,
    next_id: u32,
}

impl MonsterSpawner {
    /// Creates a spawner using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            last_spawn_time: GameTime::ZERO,
            next_id: 0,
        }
    }

    /// In-game time of the last due spawn attempt.
    #[must_use]
    pub const fn last_spawn_time(&self) -> GameTime {
        self.last_spawn_time
    }

    /// Spawns one monster into `ai` when the interval has elapsed.
    ///
    /// Candidate cells must be walkable, free of enchantments and monsters,
    /// and further than the clearance distance from the player. The timer
    /// restarts even when every candidate is rejected.
    pub fn tick(
        &mut self,
        now: GameTime,
        ctx: &mut MonsterContext<'_>,
        ai: &mut MonsterAi,
        rng: &mut dyn RngCore,
        out: &mut Vec<Event>,
    ) {
        if now.since(self.last_spawn_time) < self.config.spawn_interval_secs {
            return;
        }
        self.last_spawn_time = now;

        let tile_length = ctx.map.tile_length();
        let player_cell = ctx.map.cell_at(ctx.player.position());
        let clearance = self.config.player_clearance_tiles;
        let occupancy = ctx.occupancy;
        let population: &MonsterAi = ai;
        let Some(cell) = ctx
            .map
            .find_open_cell(rng, self.config.placement_attempts, |cell| {
                occupancy.is_location_available(cell)
                    && !population.occupies(cell, tile_length)
                    && player_cell.map_or(true, |player| player.manhattan_distance(cell) > clearance)
            })
        else {
            debug!("no free cell for monster");
            return;
        };

        let kind = MonsterKind::ALL[rng.gen_range(0..MonsterKind::ALL.len())];
        let _ = self.spawn_at(kind, cell, now, ctx.map, ai, out);
    }

    /// Places a monster of `kind` on `cell` without any placement checks.
    ///
    /// Wizards turn their cell see-through until they leave.
    pub fn spawn_at(
        &mut self,
        kind: MonsterKind,
        cell: CellCoord,
        now: GameTime,
        map: &mut CollisionMap,
        ai: &mut MonsterAi,
        out: &mut Vec<Event>,
    ) -> MonsterId {
        let id = MonsterId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        if kind == MonsterKind::Wizard {
            map.mark_transparent(cell);
        }
        ai.insert(Monster::new(
            id,
            kind,
            cell.center(map.tile_length()),
            self.config.fighter_speed_tiles,
            now,
        ));
        debug!(id = id.get(), ?kind, column = cell.column(), row = cell.row(), "monster spawned");
        out.push(Event::MonsterSpawned { id, kind, cell });
        id
    }

    /// Restarts the spawn timer, for hall changes.
    pub fn reset(&mut self) {
        self.last_spawn_time = GameTime::ZERO;
    }
}
