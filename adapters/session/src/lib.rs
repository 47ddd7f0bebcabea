#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven controller that runs a Rune Hall hall end to end.
//!
//! A [`Session`] owns the world, the game clock and every tick-driven
//! system. Each frame it applies the player's intents, routes clicks to the
//! collectors, feeds elapsed time into the clock and runs the logic pipeline
//! once per whole second fired: monster spawning, monster behaviour,
//! enchantment spawning, then timed-state expiry.

mod tuning;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rune_hall_core::{
    ClockReading, Command, Direction, Event, FailureReason, GemClearReason, HallName, PixelPoint,
};
use rune_hall_system_clock::GameClock;
use rune_hall_system_enchantments::{Enchantment, EnchantmentSpawner};
use rune_hall_system_monsters::{Monster, MonsterAi, MonsterContext, MonsterSpawner};
use rune_hall_world::{
    apply, query, CollisionMap, HallParts, LoadReport, RegistryError, World,
};
use tracing::info;

pub use tuning::{SessionTuning, TuningError};

/// Player intents captured by the input layer for a single frame.
///
/// Boolean pulses are consumed once; the caller resets them between frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Player position computed by the external movement code.
    pub player_position: Option<PixelPoint>,
    /// Click position in hall pixels.
    pub click: Option<PixelPoint>,
    /// Use a stored reveal.
    pub use_reveal: bool,
    /// Use a stored cloak.
    pub use_cloak: bool,
    /// Throw a stored luring gem in this direction.
    pub throw_gem: Option<Direction>,
}

/// Progress of the hall being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// The hall is running.
    Playing,
    /// The player collected the rune.
    Completed,
    /// The hall was lost.
    Failed(FailureReason),
}

/// Owns one playthrough of a hall and advances it frame by frame.
#[derive(Debug)]
pub struct Session {
    tuning: SessionTuning,
    world: World,
    clock: GameClock,
    enchantments: EnchantmentSpawner,
    monster_spawner: MonsterSpawner,
    monsters: MonsterAi,
    rng: ChaCha8Rng,
    status: SessionStatus,
}

impl Session {
    /// Creates a session playing the first hall on `map` with no build objects.
    #[must_use]
    pub fn new(map: CollisionMap, tuning: SessionTuning) -> Self {
        let clock = GameClock::new(tuning.clock.budget_for(0));
        Self {
            world: World::new(map, tuning.world.clone()),
            clock,
            enchantments: EnchantmentSpawner::new(tuning.enchantments),
            monster_spawner: MonsterSpawner::new(tuning.monsters),
            monsters: MonsterAi::new(tuning.monsters),
            rng: ChaCha8Rng::seed_from_u64(tuning.seed),
            status: SessionStatus::Playing,
            tuning,
        }
    }

    /// Replaces the build objects of every hall from a world JSON document.
    ///
    /// The active hall restarts from zero: its monsters, enchantments and gem
    /// are dropped, spawn timers rewind and the clock is resized to the new
    /// furnishing. On malformed input the registry is left empty, play
    /// continues in the empty hall and the parse error is returned.
    pub fn load_world(
        &mut self,
        document: Option<&str>,
        out: &mut Vec<Event>,
    ) -> Result<LoadReport, RegistryError> {
        self.exit_hall(out);
        self.world.restart_timeline();
        let loaded = self
            .world
            .objects_mut()
            .load_from_json(document, &mut self.rng);
        self.reset_clock();
        self.status = SessionStatus::Playing;
        let report = loaded?;
        if let Some(holder) = report.rune_holder {
            out.push(Event::RunePlaced { holder });
        }
        Ok(report)
    }

    /// Leaves the current hall and starts `hall` laid out on `map`.
    pub fn enter_hall(&mut self, hall: HallName, map: CollisionMap, out: &mut Vec<Event>) {
        self.exit_hall(out);
        self.world.enter_hall(hall, map, &mut self.rng, out);
        self.reset_clock();
        self.status = SessionStatus::Playing;
        info!(%hall, budget = self.clock.reading().initial_secs, "hall started");
    }

    /// Drops every monster, enchantment and lying gem of the current hall.
    pub fn exit_hall(&mut self, out: &mut Vec<Event>) {
        let HallParts { map, gem, .. } = self.world.parts_mut();
        self.monsters.clear(map);
        self.enchantments.clear();
        self.monster_spawner.reset();
        if gem.clear().is_some() {
            out.push(Event::GemCleared {
                reason: GemClearReason::HallExited,
            });
        }
    }

    /// Suspends the clock; frames still process input but no tick fires.
    pub fn pause(&mut self, out: &mut Vec<Event>) {
        self.clock.pause(out);
    }

    /// Resumes the clock from its preserved value.
    pub fn resume(&mut self, out: &mut Vec<Event>) {
        self.clock.resume(out);
    }

    /// Reports whether the clock is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Advances the session by one frame and returns everything that happened.
    ///
    /// Once the hall is completed or failed, frames are inert.
    pub fn frame(&mut self, dt: Duration, input: &FrameInput) -> Vec<Event> {
        let mut out = Vec::new();
        if self.status != SessionStatus::Playing {
            return out;
        }

        self.apply_input(input, &mut out);
        let bonus = self.world.player_mut().take_bonus_time();
        self.clock.add_time(bonus, &mut out);
        if self.check_outcome(&mut out) {
            return out;
        }

        let mut ticks = Vec::new();
        let _ = self.clock.advance(dt, &mut ticks);
        for tick in ticks {
            let Event::ClockTicked {
                now,
                remaining_secs,
            } = tick
            else {
                continue;
            };
            out.push(tick);
            let reading = ClockReading::new(now, remaining_secs, self.clock.reading().initial_secs);
            self.run_tick(reading, &mut out);
            if self.check_outcome(&mut out) {
                break;
            }
        }
        out
    }

    /// Tuning the session was created with.
    #[must_use]
    pub const fn tuning(&self) -> &SessionTuning {
        &self.tuning
    }

    /// Authoritative hall state, for renderers and the [`query`] module.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of the game clock.
    #[must_use]
    pub const fn clock(&self) -> ClockReading {
        self.clock.reading()
    }

    /// Enchantments lying in the hall.
    #[must_use]
    pub fn enchantments(&self) -> &[Enchantment] {
        self.enchantments.enchantments()
    }

    /// Monsters roaming the hall.
    #[must_use]
    pub fn monsters(&self) -> &[Monster] {
        self.monsters.monsters()
    }

    /// Progress of the current hall.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    fn apply_input(&mut self, input: &FrameInput, out: &mut Vec<Event>) {
        if let Some(to) = input.player_position {
            apply(&mut self.world, Command::MovePlayer { to }, out);
        }
        if input.use_reveal {
            apply(&mut self.world, Command::UseReveal, out);
        }
        if input.use_cloak {
            apply(&mut self.world, Command::UseCloak, out);
        }
        if let Some(direction) = input.throw_gem {
            apply(&mut self.world, Command::ThrowGem { direction }, out);
        }
        if let Some(click) = input.click {
            let now = self.clock.now();
            let HallParts {
                map,
                objects,
                player,
                ..
            } = self.world.parts_mut();
            let tile_length = map.tile_length();
            let _ = objects.handle_click(click, tile_length, player, now, out);
            let _ = self
                .enchantments
                .handle_click(click, tile_length, player, out);
        }
    }

    fn run_tick(&mut self, reading: ClockReading, out: &mut Vec<Event>) {
        let now = reading.now;
        let HallParts {
            map,
            objects,
            player,
            gem,
        } = self.world.parts_mut();
        let mut ctx = MonsterContext {
            map,
            player,
            gem,
            runes: objects,
            occupancy: &self.enchantments,
        };
        self.monster_spawner
            .tick(now, &mut ctx, &mut self.monsters, &mut self.rng, out);
        self.monsters
            .update_all(reading, &mut ctx, &mut self.rng, out);

        self.enchantments.tick(
            now,
            query::collision_map(&self.world),
            &mut self.rng,
            out,
        );
        apply(&mut self.world, Command::AdvanceTo { now }, out);
    }

    // Returns `true` once the hall has ended.
    fn check_outcome(&mut self, out: &mut Vec<Event>) -> bool {
        let hall = query::hall(&self.world);
        let player = query::player(&self.world);
        let status = if player.holds_rune() {
            SessionStatus::Completed
        } else if !player.is_alive() {
            SessionStatus::Failed(FailureReason::OutOfLives)
        } else if self.clock.is_expired() {
            SessionStatus::Failed(FailureReason::OutOfTime)
        } else {
            return false;
        };

        self.status = status;
        match status {
            SessionStatus::Completed => {
                info!(%hall, now = self.clock.now().secs(), "hall completed");
                out.push(Event::HallCompleted { hall });
            }
            SessionStatus::Failed(reason) => {
                info!(%hall, ?reason, "hall failed");
                out.push(Event::HallFailed { hall, reason });
            }
            SessionStatus::Playing => {}
        }
        true
    }

    fn reset_clock(&mut self) {
        let hall = query::hall(&self.world);
        let objects = query::objects(&self.world).objects_for_hall(hall).len();
        self.clock.reset(self.tuning.clock.budget_for(objects));
    }
}
