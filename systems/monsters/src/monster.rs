//! Monster records and their per-kind state.

use rune_hall_core::{
    CellCoord, Direction, GameTime, MonsterId, MonsterKind, PixelPoint, WizardStrategy,
};

/// Patrol and attack bookkeeping for a fighter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FighterState {
    pub(crate) last_attack: Option<GameTime>,
    pub(crate) movement_cycle_start: GameTime,
    pub(crate) is_moving: bool,
    pub(crate) direction: Direction,
    pub(crate) picked_direction_this_cycle: bool,
}

impl FighterState {
    pub(crate) const fn new(now: GameTime) -> Self {
        Self {
            last_attack: None,
            movement_cycle_start: now,
            is_moving: false,
            direction: Direction::North,
            picked_direction_this_cycle: false,
        }
    }

    /// In-game time of the last strike, if the fighter has struck.
    #[must_use]
    pub const fn last_attack(&self) -> Option<GameTime> {
        self.last_attack
    }

    /// Reports whether the fighter is in the walking half of its patrol cycle.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Direction chosen for the current patrol cycle.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Shot bookkeeping for an archer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArcherState {
    pub(crate) last_shot: Option<GameTime>,
}

impl ArcherState {
    /// In-game time the archer last loosed an arrow, if it has.
    #[must_use]
    pub const fn last_shot(&self) -> Option<GameTime> {
        self.last_shot
    }
}

/// Strategy bracket and scratch fields for a wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WizardState {
    pub(crate) strategy: Option<WizardStrategy>,
    pub(crate) strategy_start: GameTime,
    pub(crate) last_rune_transfer: GameTime,
    pub(crate) teleported_at: Option<GameTime>,
}

impl WizardState {
    pub(crate) const fn new(now: GameTime) -> Self {
        Self {
            strategy: None,
            strategy_start: now,
            last_rune_transfer: now,
            teleported_at: None,
        }
    }

    /// Strategy currently followed; `None` until the first evaluation.
    #[must_use]
    pub const fn strategy(&self) -> Option<WizardStrategy> {
        self.strategy
    }

    /// In-game time the current strategy was adopted.
    #[must_use]
    pub const fn strategy_start(&self) -> GameTime {
        self.strategy_start
    }

    /// Reports whether the wizard has already teleported the player.
    #[must_use]
    pub const fn has_teleported_player(&self) -> bool {
        self.teleported_at.is_some()
    }
}

/// Behaviour-specific state, tagged by monster kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MonsterState {
    /// Melee monster.
    Fighter(FighterState),
    /// Stationary shooter.
    Archer(ArcherState),
    /// Stationary caster.
    Wizard(WizardState),
}

/// A monster roaming the active hall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Monster {
    pub(crate) id: MonsterId,
    pub(crate) position: PixelPoint,
    pub(crate) speed_tiles: f32,
    pub(crate) state: MonsterState,
    pub(crate) should_disappear: bool,
}

impl Monster {
    pub(crate) fn new(
        id: MonsterId,
        kind: MonsterKind,
        position: PixelPoint,
        speed_tiles: f32,
        now: GameTime,
    ) -> Self {
        let state = match kind {
            MonsterKind::Fighter => MonsterState::Fighter(FighterState::new(now)),
            MonsterKind::Archer => MonsterState::Archer(ArcherState { last_shot: None }),
            MonsterKind::Wizard => MonsterState::Wizard(WizardState::new(now)),
        };
        let speed_tiles = if kind == MonsterKind::Fighter {
            speed_tiles
        } else {
            0.0
        };
        Self {
            id,
            position,
            speed_tiles,
            state,
            should_disappear: false,
        }
    }

    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> MonsterId {
        self.id
    }

    /// Kind derived from the behaviour state.
    #[must_use]
    pub const fn kind(&self) -> MonsterKind {
        match self.state {
            MonsterState::Fighter(_) => MonsterKind::Fighter,
            MonsterState::Archer(_) => MonsterKind::Archer,
            MonsterState::Wizard(_) => MonsterKind::Wizard,
        }
    }

    /// Pixel position of the monster's centre.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Tiles covered per logic tick. Zero for stationary kinds.
    #[must_use]
    pub const fn speed_tiles(&self) -> f32 {
        self.speed_tiles
    }

    /// Cell containing the monster's centre.
    #[must_use]
    pub fn cell(&self, tile_length: f32) -> Option<CellCoord> {
        CellCoord::containing(self.position, tile_length)
    }

    /// Behaviour-specific state.
    #[must_use]
    pub const fn state(&self) -> &MonsterState {
        &self.state
    }

    /// Reports whether the monster will be swept at the end of the current pass.
    #[must_use]
    pub const fn should_disappear(&self) -> bool {
        self.should_disappear
    }
}
