#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rune Hall simulation.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative hall world, and the tick-driven systems. Adapters submit
//! [`Command`] values describing player intents, the world executes them via
//! its `apply` entry point, and every component reports what happened through
//! [`Event`] values so renderers and tests can observe the simulation without
//! reaching into its internals.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Halls that make up a full run, in the order they are played.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HallName {
    /// First hall of the run.
    Earth,
    /// Second hall of the run.
    Air,
    /// Third hall of the run.
    Water,
    /// Final hall of the run.
    Fire,
}

impl HallName {
    /// Every hall in play order.
    pub const ALL: [HallName; 4] = [Self::Earth, Self::Air, Self::Water, Self::Fire];

    /// Canonical upper-case label used in world JSON documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earth => "EARTH",
            Self::Air => "AIR",
            Self::Water => "WATER",
            Self::Fire => "FIRE",
        }
    }

    /// Hall that follows this one, if the run continues.
    #[must_use]
    pub const fn next(self) -> Option<HallName> {
        match self {
            Self::Earth => Some(Self::Air),
            Self::Air => Some(Self::Water),
            Self::Water => Some(Self::Fire),
            Self::Fire => None,
        }
    }
}

impl fmt::Display for HallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name any known hall.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown hall name `{0}`")]
pub struct UnknownHall(pub String);

impl FromStr for HallName {
    type Err = UnknownHall;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        HallName::ALL
            .into_iter()
            .find(|hall| hall.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownHall(value.to_owned()))
    }
}

/// Whole seconds of in-game time, distinct from wall-clock time.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GameTime(u64);

impl GameTime {
    /// Moment the hall clock starts counting.
    pub const ZERO: GameTime = GameTime(0);

    /// Creates a new in-game timestamp from whole seconds.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Retrieves the timestamp in whole seconds.
    #[must_use]
    pub const fn secs(&self) -> u64 {
        self.0
    }

    /// Timestamp advanced by the provided number of seconds.
    #[must_use]
    pub const fn after(self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    /// Seconds elapsed since `earlier`, clamped to zero when `earlier` lies ahead.
    #[must_use]
    pub const fn since(self, earlier: GameTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Snapshot of the game clock handed to systems on every logic tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockReading {
    /// Current in-game time.
    pub now: GameTime,
    /// Seconds left before the hall times out.
    pub remaining_secs: u64,
    /// Seconds the hall started with.
    pub initial_secs: u64,
}

impl ClockReading {
    /// Creates a reading from its parts.
    #[must_use]
    pub const fn new(now: GameTime, remaining_secs: u64, initial_secs: u64) -> Self {
        Self {
            now,
            remaining_secs,
            initial_secs,
        }
    }

    /// Remaining time as a percentage of the initial budget.
    ///
    /// Bonus time may push the value above 100. A zero budget reads as 0.
    #[must_use]
    pub fn ratio_percent(&self) -> f32 {
        if self.initial_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f32 / self.initial_secs as f32 * 100.0
    }
}

/// Behaviour a wizard adopts for a given time-ratio bracket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WizardStrategy {
    /// Plenty of time left: the wizard keeps relocating the rune.
    High,
    /// Middle bracket: the wizard idles and then vanishes.
    Mid,
    /// Little time left: the wizard teleports the player once and vanishes.
    Low,
}

impl WizardStrategy {
    /// Selects the strategy for a time ratio expressed in percent.
    ///
    /// Below 30 is `Low`, 30 through 70 inclusive is `Mid`, above 70 is `High`.
    #[must_use]
    pub fn for_ratio(ratio_percent: f32) -> Self {
        if ratio_percent < 30.0 {
            Self::Low
        } else if ratio_percent <= 70.0 {
            Self::Mid
        } else {
            Self::High
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Resolves the cell containing a pixel position, if the position is not negative.
    #[must_use]
    pub fn containing(point: PixelPoint, tile_length: f32) -> Option<CellCoord> {
        if tile_length <= 0.0 || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / tile_length).floor();
        let row = (point.y / tile_length).floor();
        if column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Pixel position of the cell's upper-left corner.
    #[must_use]
    pub fn origin(self, tile_length: f32) -> PixelPoint {
        PixelPoint::new(
            self.column as f32 * tile_length,
            self.row as f32 * tile_length,
        )
    }

    /// Pixel position of the cell's centre.
    #[must_use]
    pub fn center(self, tile_length: f32) -> PixelPoint {
        let half = tile_length / 2.0;
        self.origin(tile_length).offset(half, half)
    }

    /// Reports whether a pixel position falls inside the cell's bounds.
    #[must_use]
    pub fn bounds_contain(self, point: PixelPoint, tile_length: f32) -> bool {
        let origin = self.origin(tile_length);
        point.x >= origin.x
            && point.x < origin.x + tile_length
            && point.y >= origin.y
            && point.y < origin.y + tile_length
    }

    /// Neighbouring cell one step in `direction`, if it stays on the non-negative grid.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = cell.column();
        let row = cell.row();
        column >= self.origin.column()
            && row >= self.origin.row()
            && u64::from(column) < u64::from(self.origin.column()) + u64::from(self.size.width())
            && u64::from(row) < u64::from(self.origin.row()) + u64::from(self.size.height())
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Position in hall space measured in pixels from the upper-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Horizontal offset in pixels.
    pub x: f32,
    /// Vertical offset in pixels.
    pub y: f32,
}

impl PixelPoint {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position shifted by the provided deltas.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(self, other: PixelPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Sum of the absolute axis deltas to another position.
    #[must_use]
    pub fn manhattan_distance_to(self, other: PixelPoint) -> f32 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }

    /// Moves toward `target` by at most `step` pixels.
    ///
    /// Returns `self` unchanged when the two positions coincide.
    #[must_use]
    pub fn step_toward(self, target: PixelPoint, step: f32) -> PixelPoint {
        let distance = self.distance_to(target);
        if distance <= f32::EPSILON {
            return self;
        }
        let scale = step.min(distance) / distance;
        self.offset((target.x - self.x) * scale, (target.y - self.y) * scale)
    }
}

/// Cardinal directions used for patrols and thrown items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction, clockwise from north.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Unit vector pointing in the direction, in pixel space.
    #[must_use]
    pub const fn unit(self) -> (f32, f32) {
        match self {
            Self::North => (0.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }
}

/// Unique identifier assigned to a monster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(u32);

impl MonsterId {
    /// Creates a new monster identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a spawned enchantment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnchantmentId(u32);

impl EnchantmentId {
    /// Creates a new enchantment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Stable handle to a placed build object: its hall plus its slot in that hall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    hall: HallName,
    index: usize,
}

impl ObjectId {
    /// Creates a handle for the object stored at `index` in `hall`.
    #[must_use]
    pub const fn new(hall: HallName, index: usize) -> Self {
        Self { hall, index }
    }

    /// Hall that owns the object.
    #[must_use]
    pub const fn hall(&self) -> HallName {
        self.hall
    }

    /// Position of the object within its hall's list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

/// Kinds of monster that roam a hall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MonsterKind {
    /// Melee monster that patrols, chases and strikes adjacent players.
    Fighter,
    /// Stationary monster that shoots players within range.
    Archer,
    /// Stationary caster whose behaviour follows the remaining time.
    Wizard,
}

impl MonsterKind {
    /// Every monster kind, used for uniform spawn selection.
    pub const ALL: [MonsterKind; 3] = [Self::Fighter, Self::Archer, Self::Wizard];
}

/// Collectible power-ups and the rune itself.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EnchantmentKind {
    /// Adds seconds to the hall clock when collected.
    ExtraTime,
    /// Restores one life when collected.
    ExtraLife,
    /// Stored; reveals the region around the rune when used.
    Reveal,
    /// Stored; hides the player from archers when used.
    Cloak,
    /// Stored; thrown to distract fighters.
    LuringGem,
    /// The hall's unique objective. Never spawned by the enchantment spawner.
    Rune,
}

impl EnchantmentKind {
    /// Kinds the enchantment spawner draws from, uniformly.
    pub const SPAWNABLE: [EnchantmentKind; 5] = [
        Self::ExtraTime,
        Self::ExtraLife,
        Self::Reveal,
        Self::Cloak,
        Self::LuringGem,
    ];

    /// Reports whether collecting the kind applies its effect immediately.
    #[must_use]
    pub const fn is_instant(self) -> bool {
        matches!(self, Self::ExtraTime | Self::ExtraLife)
    }
}

/// Why a thrown luring gem left the hall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GemClearReason {
    /// A fighter walked up to the gem.
    Reached,
    /// The gem's lifetime ran out.
    Expired,
    /// The hall was exited.
    HallExited,
}

/// Why a hall ended without the rune being collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The player ran out of lives.
    OutOfLives,
    /// The hall clock reached zero.
    OutOfTime,
}

/// Player intents consumed by the world once per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the world's notion of in-game time and expires timed state.
    AdvanceTo {
        /// In-game time reached by the clock.
        now: GameTime,
    },
    /// Records the player's position as computed by the external movement code.
    MovePlayer {
        /// New player position.
        to: PixelPoint,
    },
    /// Activates a stored reveal enchantment.
    UseReveal,
    /// Activates a stored cloak enchantment.
    UseCloak,
    /// Throws a stored luring gem in the provided direction.
    ThrowGem {
        /// Direction the gem travels from the player.
        direction: Direction,
    },
}

/// Events broadcast by the world and systems after processing a frame or tick.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The game clock emitted a whole-second tick.
    ClockTicked {
        /// In-game time after the tick.
        now: GameTime,
        /// Seconds remaining after the tick.
        remaining_secs: u64,
    },
    /// The game clock stopped emitting ticks.
    ClockPaused,
    /// The game clock resumed from its preserved value.
    ClockResumed,
    /// Seconds were added to the hall clock.
    TimeAdded {
        /// Number of seconds added.
        seconds: u64,
    },
    /// A monster dealt damage to the player.
    PlayerDamaged {
        /// Monster responsible for the damage.
        source: MonsterId,
        /// Lives left after the hit.
        lives_remaining: u32,
    },
    /// A wizard moved the player to another cell.
    PlayerTeleported {
        /// Wizard that cast the teleport.
        source: MonsterId,
        /// Cell the player now occupies.
        to: CellCoord,
    },
    /// The player gained a life.
    LifeGained {
        /// Lives after the gain.
        lives: u32,
    },
    /// The player requested bonus seconds for the hall clock.
    BonusTimeRequested {
        /// Seconds requested.
        seconds: u64,
    },
    /// A stored enchantment was activated as a timed buff.
    BuffActivated {
        /// Kind of buff activated.
        kind: EnchantmentKind,
        /// In-game time at which the buff lapses.
        until: GameTime,
    },
    /// A timed buff lapsed.
    BuffExpired {
        /// Kind of buff that lapsed.
        kind: EnchantmentKind,
    },
    /// An ability request could not be honoured.
    AbilityRejected {
        /// Inventory kind the ability needed.
        kind: EnchantmentKind,
    },
    /// A luring gem landed in the hall.
    GemThrown {
        /// Where the gem landed.
        at: PixelPoint,
    },
    /// The luring gem was removed from the hall.
    GemCleared {
        /// Why the gem was removed.
        reason: GemClearReason,
    },
    /// The rune was assigned to an object after a hall load.
    RunePlaced {
        /// Object now holding the rune.
        holder: ObjectId,
    },
    /// The rune moved from one object to another.
    RuneTransferred {
        /// Object that held the rune before the move, if any.
        from: Option<ObjectId>,
        /// Object holding the rune after the move.
        to: ObjectId,
    },
    /// The player took the rune from an object.
    RuneCollected {
        /// Object the rune was taken from.
        from: ObjectId,
    },
    /// The player inspected a rune-free object within reach.
    ObjectAcknowledged {
        /// Object that was inspected.
        object: ObjectId,
        /// In-game time at which the acknowledgement fades.
        until: GameTime,
    },
    /// An enchantment appeared in the hall.
    EnchantmentSpawned {
        /// Identifier of the enchantment.
        id: EnchantmentId,
        /// Kind of the enchantment.
        kind: EnchantmentKind,
        /// Cell the enchantment occupies.
        cell: CellCoord,
    },
    /// An enchantment disappeared after its lifetime elapsed.
    EnchantmentExpired {
        /// Identifier of the enchantment.
        id: EnchantmentId,
        /// Kind of the enchantment.
        kind: EnchantmentKind,
    },
    /// The player collected an enchantment.
    EnchantmentCollected {
        /// Identifier of the enchantment.
        id: EnchantmentId,
        /// Kind of the enchantment.
        kind: EnchantmentKind,
    },
    /// A monster appeared in the hall.
    MonsterSpawned {
        /// Identifier of the monster.
        id: MonsterId,
        /// Kind of the monster.
        kind: MonsterKind,
        /// Cell the monster spawned on.
        cell: CellCoord,
    },
    /// A monster left the hall.
    MonsterRemoved {
        /// Identifier of the monster.
        id: MonsterId,
        /// Kind of the monster.
        kind: MonsterKind,
    },
    /// A wizard switched strategy.
    WizardStrategyChanged {
        /// Identifier of the wizard.
        id: MonsterId,
        /// Strategy now active.
        strategy: WizardStrategy,
    },
    /// The player collected the rune and cleared the hall.
    HallCompleted {
        /// Hall that was cleared.
        hall: HallName,
    },
    /// The hall ended without the rune being collected.
    HallFailed {
        /// Hall that was lost.
        hall: HallName,
        /// Cause of the loss.
        reason: FailureReason,
    },
}

/// Answers whether a cell is free of live enchantments.
///
/// Spawners and the wizard teleport use this to avoid stacking entities.
pub trait CellOccupancy {
    /// Returns `true` when no live enchantment occupies `cell`.
    fn is_location_available(&self, cell: CellCoord) -> bool;
}
