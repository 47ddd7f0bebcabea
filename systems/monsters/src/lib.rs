#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Monster spawning and per-kind behaviour for Rune Hall.
//!
//! [`MonsterSpawner`] populates the active hall on a timer and
//! [`MonsterAi`] advances every monster once per logic tick. Both borrow the
//! hall state they touch through a [`MonsterContext`] instead of holding
//! references into the world.

mod ai;
mod monster;
mod spawner;
mod wizard;

use rune_hall_core::CellOccupancy;
use rune_hall_world::{CollisionMap, LuringGemSlot, Player, RuneRelocator};
use serde::{Deserialize, Serialize};

pub use ai::MonsterAi;
pub use monster::{ArcherState, FighterState, Monster, MonsterState, WizardState};
pub use spawner::MonsterSpawner;

/// Tunable parameters shared by the monster spawner and AI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between spawn attempts.
    pub spawn_interval_secs: u64,
    /// Random cells drawn before a spawn or teleport search is abandoned.
    pub placement_attempts: usize,
    /// Cells within this Manhattan distance of the player never receive a spawn.
    pub player_clearance_tiles: u32,
    /// Tiles a fighter covers per logic tick.
    pub fighter_speed_tiles: f32,
    /// Distance, in tiles, at which a fighter starts chasing the player.
    pub fighter_chase_tiles: f32,
    /// Seconds between two fighter strikes.
    pub fighter_attack_cooldown_secs: u64,
    /// Seconds a patrolling fighter walks before pausing.
    pub patrol_move_secs: u64,
    /// Seconds a patrolling fighter rests before picking a new direction.
    pub patrol_pause_secs: u64,
    /// Adjacent fighters strike even while a luring gem is lying in the hall.
    pub attack_while_lured: bool,
    /// Range, in tiles, below which an archer hits the player.
    pub archer_range_tiles: f32,
    /// Seconds between two archer shots.
    pub archer_cooldown_secs: u64,
    /// Seconds between two rune relocations by a wizard with plenty of time left.
    pub wizard_transfer_interval_secs: u64,
    /// Seconds a wizard in the middle bracket lingers before vanishing.
    pub wizard_linger_secs: u64,
    /// Seconds a wizard in the low bracket waits before teleporting the player.
    pub wizard_teleport_delay_secs: u64,
    /// Seconds between the teleport and the wizard vanishing.
    pub wizard_vanish_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 8,
            placement_attempts: 50,
            player_clearance_tiles: 2,
            fighter_speed_tiles: 1.0,
            fighter_chase_tiles: 5.0,
            fighter_attack_cooldown_secs: 1,
            patrol_move_secs: 1,
            patrol_pause_secs: 1,
            attack_while_lured: true,
            archer_range_tiles: 3.0,
            archer_cooldown_secs: 1,
            wizard_transfer_interval_secs: 3,
            wizard_linger_secs: 2,
            wizard_teleport_delay_secs: 1,
            wizard_vanish_delay_secs: 1,
        }
    }
}

/// Hall state borrowed by the monster systems for one tick.
pub struct MonsterContext<'a> {
    /// Collision map of the active hall; wizards toggle its transparency overlay.
    pub map: &'a mut CollisionMap,
    /// The player monsters hunt.
    pub player: &'a mut Player,
    /// Luring gem that distracts fighters.
    pub gem: &'a mut LuringGemSlot,
    /// Handle used by wizards to move the rune.
    pub runes: &'a mut dyn RuneRelocator,
    /// Enchantment occupancy consulted by spawn and teleport searches.
    pub occupancy: &'a dyn CellOccupancy,
}
