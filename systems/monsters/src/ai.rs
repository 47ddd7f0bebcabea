//! Per-tick behaviour of every monster in the active hall.

use rand::{Rng, RngCore};
use rune_hall_core::{
    CellCoord, ClockReading, Direction, Event, GameTime, GemClearReason, MonsterId, MonsterKind,
    PixelPoint,
};
use rune_hall_world::CollisionMap;
use tracing::debug;

use crate::{
    monster::{ArcherState, FighterState, Monster, MonsterState},
    wizard, Config, MonsterContext,
};

/// Owns the monsters of the active hall and advances them once per logic tick.
#[derive(Debug)]
pub struct MonsterAi {
    config: Config,
    monsters: Vec<Monster>,
}

impl MonsterAi {
    /// Creates an empty population using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            monsters: Vec::new(),
        }
    }

    /// Parameters the AI was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Monsters currently in the hall, in spawn order.
    #[must_use]
    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    /// Reports whether a monster stands on `cell`.
    #[must_use]
    pub fn occupies(&self, cell: CellCoord, tile_length: f32) -> bool {
        self.monsters
            .iter()
            .any(|monster| monster.cell(tile_length) == Some(cell))
    }

    pub(crate) fn insert(&mut self, monster: Monster) {
        self.monsters.push(monster);
    }

    /// Runs every monster's behaviour for the tick described by `reading`.
    ///
    /// Monsters that decide to leave are removed once the whole pass has run,
    /// so removal never disturbs the iteration.
    pub fn update_all(
        &mut self,
        reading: ClockReading,
        ctx: &mut MonsterContext<'_>,
        rng: &mut dyn RngCore,
        out: &mut Vec<Event>,
    ) {
        let config = &self.config;
        for monster in &mut self.monsters {
            let Monster {
                id,
                position,
                speed_tiles,
                state,
                should_disappear,
            } = monster;
            let vanish = match state {
                MonsterState::Fighter(fighter) => {
                    let body = Body {
                        id: *id,
                        position,
                        speed_tiles: *speed_tiles,
                    };
                    update_fighter(config, body, fighter, reading.now, ctx, rng, out);
                    false
                }
                MonsterState::Archer(archer) => {
                    update_archer(config, *id, *position, archer, reading.now, ctx, out);
                    false
                }
                MonsterState::Wizard(wizard) => {
                    wizard::update(config, *id, wizard, reading, ctx, rng, out)
                }
            };
            if vanish {
                *should_disappear = true;
            }
        }
        self.sweep(ctx.map, out);
    }

    /// Drops every monster without events, reverting wizard overlays.
    pub fn clear(&mut self, map: &mut CollisionMap) {
        let tile_length = map.tile_length();
        for monster in self.monsters.drain(..) {
            if monster.kind() == MonsterKind::Wizard {
                if let Some(cell) = monster.cell(tile_length) {
                    let _ = map.clear_transparent(cell);
                }
            }
        }
    }

    fn sweep(&mut self, map: &mut CollisionMap, out: &mut Vec<Event>) {
        let tile_length = map.tile_length();
        self.monsters.retain(|monster| {
            if !monster.should_disappear {
                return true;
            }
            if monster.kind() == MonsterKind::Wizard {
                if let Some(cell) = monster.cell(tile_length) {
                    let _ = map.clear_transparent(cell);
                }
            }
            debug!(id = monster.id.get(), kind = ?monster.kind(), "monster removed");
            out.push(Event::MonsterRemoved {
                id: monster.id,
                kind: monster.kind(),
            });
            false
        });
    }
}

// Mutable view of the parts of a fighter that move with it.
struct Body<'m> {
    id: MonsterId,
    position: &'m mut PixelPoint,
    speed_tiles: f32,
}

fn update_fighter(
    config: &Config,
    body: Body<'_>,
    state: &mut FighterState,
    now: GameTime,
    ctx: &mut MonsterContext<'_>,
    rng: &mut dyn RngCore,
    out: &mut Vec<Event>,
) {
    let Body {
        id,
        position,
        speed_tiles,
    } = body;
    let step = speed_tiles * ctx.map.tile_length();
    let tile_length = ctx.map.tile_length();
    let player_position = ctx.player.position();
    let own_cell = ctx.map.cell_at(*position);
    let player_cell = ctx.map.cell_at(player_position);
    let adjacent = matches!(
        (own_cell, player_cell),
        (Some(own), Some(player)) if own.manhattan_distance(player) <= 1
    );
    let lured = ctx.gem.is_active();

    if adjacent && (config.attack_while_lured || !lured) {
        let ready = state.last_attack.map_or(true, |last| {
            now.since(last) >= config.fighter_attack_cooldown_secs
        });
        if ready {
            state.last_attack = Some(now);
            let lives_remaining = ctx.player.lose_life();
            debug!(id = id.get(), lives_remaining, "fighter struck the player");
            out.push(Event::PlayerDamaged {
                source: id,
                lives_remaining,
            });
        }
        return;
    }

    if let Some(gem) = ctx.gem.current().copied() {
        let target = gem.position();
        let reached = position.distance_to(target) <= step;
        let next = position.step_toward(target, step);
        try_move(ctx.map, position, next);
        if reached {
            let _ = ctx.gem.clear();
            debug!(id = id.get(), "fighter reached the luring gem");
            out.push(Event::GemCleared {
                reason: GemClearReason::Reached,
            });
        }
        return;
    }

    if position.distance_to(player_position) <= config.fighter_chase_tiles * tile_length {
        let next = position.step_toward(player_position, step);
        try_move(ctx.map, position, next);
        return;
    }

    if let Some(direction) = patrol_direction(config, state, now, rng) {
        let (dx, dy) = direction.unit();
        let next = position.offset(dx * step, dy * step);
        try_move(ctx.map, position, next);
    }
}

// Walk for `patrol_move_secs`, rest for `patrol_pause_secs`, then re-roll.
fn patrol_direction(
    config: &Config,
    state: &mut FighterState,
    now: GameTime,
    rng: &mut dyn RngCore,
) -> Option<Direction> {
    let cycle = config.patrol_move_secs + config.patrol_pause_secs;
    if now.since(state.movement_cycle_start) >= cycle {
        state.movement_cycle_start = now;
        state.picked_direction_this_cycle = false;
    }
    if now.since(state.movement_cycle_start) >= config.patrol_move_secs {
        state.is_moving = false;
        return None;
    }
    if !state.picked_direction_this_cycle {
        state.direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        state.picked_direction_this_cycle = true;
    }
    state.is_moving = true;
    Some(state.direction)
}

fn update_archer(
    config: &Config,
    id: MonsterId,
    position: PixelPoint,
    state: &mut ArcherState,
    now: GameTime,
    ctx: &mut MonsterContext<'_>,
    out: &mut Vec<Event>,
) {
    let ready = state
        .last_shot
        .map_or(true, |last| now.since(last) >= config.archer_cooldown_secs);
    if !ready {
        return;
    }
    state.last_shot = Some(now);

    let tile_length = ctx.map.tile_length();
    let (Some(own), Some(player)) = (
        ctx.map.cell_at(position),
        ctx.map.cell_at(ctx.player.position()),
    ) else {
        return;
    };
    let distance_tiles =
        own.center(tile_length).distance_to(player.center(tile_length)) / tile_length;
    if distance_tiles < config.archer_range_tiles && !ctx.player.is_cloaked() {
        let lives_remaining = ctx.player.lose_life();
        debug!(id = id.get(), lives_remaining, "archer hit the player");
        out.push(Event::PlayerDamaged {
            source: id,
            lives_remaining,
        });
    }
}

fn try_move(map: &CollisionMap, position: &mut PixelPoint, target: PixelPoint) {
    if !map.is_point_collidable(target) {
        *position = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rune_hall_core::CellOccupancy;
    use rune_hall_world::{LuringGemSlot, Player, RuneRelocator, RuneTransfer};

    const TILE: f32 = 10.0;

    struct NoRune;

    impl RuneRelocator for NoRune {
        fn relocate_rune(&mut self, _rng: &mut dyn RngCore) -> Option<RuneTransfer> {
            None
        }
    }

    struct Vacant;

    impl CellOccupancy for Vacant {
        fn is_location_available(&self, _cell: CellCoord) -> bool {
            true
        }
    }

    struct Hall {
        map: CollisionMap,
        player: Player,
        gem: LuringGemSlot,
    }

    impl Hall {
        fn new(player_cell: CellCoord) -> Self {
            Self {
                map: CollisionMap::walled(16, 16, TILE),
                player: Player::new(player_cell.center(TILE), 5),
                gem: LuringGemSlot::new(10),
            }
        }

        fn run(&mut self, ai: &mut MonsterAi, secs: u64, rng: &mut ChaCha8Rng) -> Vec<Event> {
            let mut runes = NoRune;
            let mut ctx = MonsterContext {
                map: &mut self.map,
                player: &mut self.player,
                gem: &mut self.gem,
                runes: &mut runes,
                occupancy: &Vacant,
            };
            let mut events = Vec::new();
            let reading = ClockReading::new(GameTime::from_secs(secs), 100, 100);
            ai.update_all(reading, &mut ctx, rng, &mut events);
            events
        }
    }

    fn ai_with(kind: MonsterKind, cell: CellCoord, config: Config) -> MonsterAi {
        let mut ai = MonsterAi::new(config);
        ai.insert(Monster::new(
            MonsterId::new(1),
            kind,
            cell.center(TILE),
            config.fighter_speed_tiles,
            GameTime::ZERO,
        ));
        ai
    }

    #[test]
    fn fighter_chases_a_nearby_player() {
        let mut hall = Hall::new(CellCoord::new(8, 5));
        let mut ai = ai_with(MonsterKind::Fighter, CellCoord::new(5, 5), Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let _ = hall.run(&mut ai, 1, &mut rng);

        assert_eq!(ai.monsters()[0].cell(TILE), Some(CellCoord::new(6, 5)));
    }

    #[test]
    fn fighter_walks_toward_a_lying_gem_and_clears_it() {
        let mut hall = Hall::new(CellCoord::new(14, 14));
        hall.gem
            .place(CellCoord::new(7, 3).center(TILE), GameTime::ZERO);
        let mut ai = ai_with(MonsterKind::Fighter, CellCoord::new(5, 3), Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        assert!(hall.run(&mut ai, 1, &mut rng).is_empty());
        let events = hall.run(&mut ai, 2, &mut rng);

        assert_eq!(
            events,
            vec![Event::GemCleared {
                reason: GemClearReason::Reached
            }]
        );
        assert!(!hall.gem.is_active());
        assert_eq!(ai.monsters()[0].cell(TILE), Some(CellCoord::new(7, 3)));
    }

    #[test]
    fn adjacent_fighter_ignores_the_gem_when_configured() {
        let mut config = Config::default();
        config.attack_while_lured = false;
        let mut hall = Hall::new(CellCoord::new(6, 5));
        hall.gem
            .place(CellCoord::new(5, 10).center(TILE), GameTime::ZERO);
        let mut ai = ai_with(MonsterKind::Fighter, CellCoord::new(5, 5), config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let events = hall.run(&mut ai, 1, &mut rng);

        assert!(events.is_empty());
        assert_eq!(hall.player.lives(), 5);
        assert_eq!(ai.monsters()[0].cell(TILE), Some(CellCoord::new(5, 6)));
    }

    #[test]
    fn fighter_never_steps_into_walls() {
        let mut hall = Hall::new(CellCoord::new(14, 14));
        let mut ai = ai_with(MonsterKind::Fighter, CellCoord::new(1, 1), Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        for secs in 1..40 {
            let _ = hall.run(&mut ai, secs, &mut rng);
            let cell = ai.monsters()[0].cell(TILE).expect("inside the grid");
            assert!(!hall.map.is_cell_collidable(cell), "t={secs} at {cell:?}");
        }
    }

    #[test]
    fn patrol_alternates_walking_and_resting() {
        let config = Config::default();
        let mut state = FighterState::new(GameTime::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        assert!(patrol_direction(&config, &mut state, GameTime::ZERO, &mut rng).is_some());
        assert!(patrol_direction(&config, &mut state, GameTime::from_secs(1), &mut rng).is_none());
        assert!(!state.is_moving());
        assert!(patrol_direction(&config, &mut state, GameTime::from_secs(2), &mut rng).is_some());
        assert_eq!(state.movement_cycle_start, GameTime::from_secs(2));
    }

    #[test]
    fn archer_hits_within_range_unless_cloaked() {
        let mut hall = Hall::new(CellCoord::new(7, 5));
        let mut ai = ai_with(MonsterKind::Archer, CellCoord::new(5, 5), Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let events = hall.run(&mut ai, 1, &mut rng);
        assert_eq!(
            events,
            vec![Event::PlayerDamaged {
                source: MonsterId::new(1),
                lives_remaining: 4,
            }]
        );
        assert_eq!(ai.monsters()[0].position(), CellCoord::new(5, 5).center(TILE));

        hall.player.activate_cloak(GameTime::from_secs(20));
        assert!(hall.run(&mut ai, 2, &mut rng).is_empty());
        assert_eq!(hall.player.lives(), 4);
    }

    #[test]
    fn archer_misses_at_three_tiles() {
        let mut hall = Hall::new(CellCoord::new(8, 5));
        let mut ai = ai_with(MonsterKind::Archer, CellCoord::new(5, 5), Config::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert!(hall.run(&mut ai, 1, &mut rng).is_empty());
        assert_eq!(hall.player.lives(), 5);
    }

    #[test]
    fn clear_reverts_wizard_overlays() {
        let mut hall = Hall::new(CellCoord::new(1, 1));
        let cell = CellCoord::new(9, 9);
        hall.map.mark_transparent(cell);
        let mut ai = ai_with(MonsterKind::Wizard, cell, Config::default());

        ai.clear(&mut hall.map);

        assert!(ai.monsters().is_empty());
        assert!(!hall.map.is_transparent(cell));
    }
}
