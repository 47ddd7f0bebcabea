//! Placed decorative objects and the single rune they hide.
//!
//! The registry owns every hall's object list and guarantees that at most one
//! object across all halls carries the rune, and that the tracked holder is
//! exactly that object. Every mutating entry point preserves the guarantee;
//! [`BuildObjectRegistry::check_invariant`] re-derives it from scratch for
//! tests.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use rune_hall_core::{
    CellCoord, EnchantmentKind, Event, GameTime, HallName, ObjectId, PixelPoint,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::player::Player;

/// Upper bound on random draws when relocating the rune.
pub const TRANSFER_ATTEMPTS: usize = 50;
/// Reach, in tile lengths, within which the player may interact with objects.
pub const INTERACTION_REACH_TILES: f32 = 3.0;
/// Seconds an inspected rune-free object stays highlighted.
pub const ACKNOWLEDGEMENT_SECS: u64 = 1;

/// Decorative object placed on a hall's grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildObject {
    #[serde(rename = "x")]
    grid_x: u32,
    #[serde(rename = "y")]
    grid_y: u32,
    #[serde(rename = "objectType")]
    object_type: String,
    #[serde(rename = "hasRune", default)]
    has_rune: bool,
}

impl BuildObject {
    /// Creates a rune-free object of `object_type` at the provided grid cell.
    #[must_use]
    pub fn new(grid_x: u32, grid_y: u32, object_type: impl Into<String>) -> Self {
        Self {
            grid_x,
            grid_y,
            object_type: object_type.into(),
            has_rune: false,
        }
    }

    /// Grid column of the object.
    #[must_use]
    pub const fn grid_x(&self) -> u32 {
        self.grid_x
    }

    /// Grid row of the object.
    #[must_use]
    pub const fn grid_y(&self) -> u32 {
        self.grid_y
    }

    /// Cell occupied by the object.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.grid_x, self.grid_y)
    }

    /// Free-form appearance tag, for example `"chest"`.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Reports whether the object currently hides the rune.
    #[must_use]
    pub const fn has_rune(&self) -> bool {
        self.has_rune
    }
}

/// Errors surfaced by registry import and export.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The world document was not valid JSON of the expected shape.
    #[error("malformed world document: {0}")]
    MalformedJson(#[source] serde_json::Error),
    /// The registry could not be serialised.
    #[error("failed to serialise world document: {0}")]
    Export(#[source] serde_json::Error),
}

/// Ways the single-rune guarantee can be broken.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// More than one object carries the rune.
    #[error("{count} objects carry the rune")]
    MultipleHolders {
        /// Number of rune-flagged objects found.
        count: usize,
    },
    /// The tracked holder disagrees with the flagged object.
    #[error("tracked holder {tracked:?} does not match flagged object {flagged:?}")]
    HolderMismatch {
        /// Holder recorded by the registry.
        tracked: Option<ObjectId>,
        /// Object actually carrying the flag.
        flagged: Option<ObjectId>,
    },
}

/// Summary of a completed world import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of objects accepted across all halls.
    pub objects: usize,
    /// Hall keys that did not name a known hall.
    pub skipped_halls: Vec<String>,
    /// Object chosen as the rune holder in the active hall.
    pub rune_holder: Option<ObjectId>,
}

/// Record of a rune relocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuneTransfer {
    /// Previous holder, if the rune was placed at all.
    pub from: Option<ObjectId>,
    /// New holder.
    pub to: ObjectId,
}

/// Result of routing a click to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No object of the active hall lies under the click.
    Missed,
    /// An object was clicked but the player stands too far away.
    OutOfReach(ObjectId),
    /// The player took the rune from the object.
    RuneCollected(ObjectId),
    /// The object holds no rune; it is briefly highlighted.
    Acknowledged(ObjectId),
}

/// Capability handle used by monsters to move the rune around.
pub trait RuneRelocator {
    /// Moves the rune to another object of the active hall, if one can be found.
    fn relocate_rune(&mut self, rng: &mut dyn RngCore) -> Option<RuneTransfer>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Acknowledgement {
    object: ObjectId,
    until: GameTime,
}

/// Per-hall object lists plus the unique rune holder.
#[derive(Clone, Debug)]
pub struct BuildObjectRegistry {
    halls: BTreeMap<HallName, Vec<BuildObject>>,
    active_hall: HallName,
    rune_holder: Option<ObjectId>,
    acknowledgement: Option<Acknowledgement>,
}

impl Default for BuildObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildObjectRegistry {
    /// Creates an empty registry with the first hall active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            halls: BTreeMap::new(),
            active_hall: HallName::Earth,
            rune_holder: None,
            acknowledgement: None,
        }
    }

    /// Hall whose objects take part in rune placement and clicks.
    #[must_use]
    pub const fn active_hall(&self) -> HallName {
        self.active_hall
    }

    /// Switches the active hall. The rune is left where it is.
    pub fn set_active_hall(&mut self, hall: HallName) {
        self.active_hall = hall;
        self.acknowledgement = None;
    }

    /// Objects placed in `hall`, in insertion order.
    #[must_use]
    pub fn objects_for_hall(&self, hall: HallName) -> &[BuildObject] {
        self.halls.get(&hall).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Object referenced by `id`, if it exists.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&BuildObject> {
        self.halls.get(&id.hall()).and_then(|objects| objects.get(id.index()))
    }

    /// Object currently carrying the rune.
    #[must_use]
    pub const fn rune_holder(&self) -> Option<ObjectId> {
        self.rune_holder
    }

    /// Drops every object in every hall.
    pub fn clear(&mut self) {
        self.halls.clear();
        self.rune_holder = None;
        self.acknowledgement = None;
    }

    /// Replaces the registry contents from a world JSON document.
    ///
    /// `None`, blank input and JSON `null` reset to an empty registry. Keys
    /// that do not name a hall are skipped with a warning. Malformed input
    /// leaves the registry empty and returns the parse error. Rune flags found
    /// in the document are discarded; a holder is drawn uniformly from the
    /// active hall instead.
    pub fn load_from_json<R>(
        &mut self,
        data: Option<&str>,
        rng: &mut R,
    ) -> Result<LoadReport, RegistryError>
    where
        R: Rng + ?Sized,
    {
        self.clear();

        let Some(text) = data.map(str::trim).filter(|text| !text.is_empty()) else {
            debug!("empty world document, registry reset");
            return Ok(LoadReport::default());
        };

        let document: Option<BTreeMap<String, Vec<BuildObject>>> =
            serde_json::from_str(text).map_err(|error| {
                warn!(%error, "malformed world document, registry reset");
                RegistryError::MalformedJson(error)
            })?;

        let mut report = LoadReport::default();
        for (key, objects) in document.unwrap_or_default() {
            let Ok(hall) = key.parse::<HallName>() else {
                warn!(hall = %key, "skipping unknown hall in world document");
                report.skipped_halls.push(key);
                continue;
            };
            report.objects += objects.len();
            self.halls.entry(hall).or_default().extend(objects);
        }

        for objects in self.halls.values_mut() {
            for object in objects.iter_mut() {
                object.has_rune = false;
            }
        }

        report.rune_holder = self.assign_random_rune(rng);
        debug!(
            objects = report.objects,
            holder = ?report.rune_holder,
            "world document loaded"
        );
        Ok(report)
    }

    /// Serialises every non-empty hall into a world JSON document.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        let document: BTreeMap<&'static str, &Vec<BuildObject>> = self
            .halls
            .iter()
            .filter(|(_, objects)| !objects.is_empty())
            .map(|(hall, objects)| (hall.as_str(), objects))
            .collect();
        serde_json::to_string(&document).map_err(RegistryError::Export)
    }

    /// Places the rune on a uniformly drawn object of the active hall.
    ///
    /// Any previous holder is cleared. Returns `None` and leaves the rune
    /// unplaced when the active hall has no objects.
    pub fn assign_random_rune<R>(&mut self, rng: &mut R) -> Option<ObjectId>
    where
        R: Rng + ?Sized,
    {
        let count = self.objects_for_hall(self.active_hall).len();
        if count == 0 {
            let _ = self.remove_rune();
            return None;
        }
        let target = ObjectId::new(self.active_hall, rng.gen_range(0..count));
        if self.set_rune(target) {
            Some(target)
        } else {
            None
        }
    }

    /// Adds an object to `hall` and returns its handle.
    ///
    /// An object arriving with the rune flag becomes the sole holder.
    pub fn add_object(&mut self, hall: HallName, mut object: BuildObject) -> ObjectId {
        let carries_rune = std::mem::replace(&mut object.has_rune, false);
        let objects = self.halls.entry(hall).or_default();
        objects.push(object);
        let id = ObjectId::new(hall, objects.len() - 1);
        if carries_rune {
            let _ = self.set_rune(id);
        }
        id
    }

    /// Destroys every object of `hall`, dropping the rune if it lived there.
    pub fn reset_hall(&mut self, hall: HallName) {
        let _ = self.halls.remove(&hall);
        if self.rune_holder.is_some_and(|holder| holder.hall() == hall) {
            self.rune_holder = None;
        }
        if self
            .acknowledgement
            .is_some_and(|acknowledgement| acknowledgement.object.hall() == hall)
        {
            self.acknowledgement = None;
        }
    }

    /// Moves the rune onto `target`. Returns `false` when `target` does not exist.
    pub fn set_rune(&mut self, target: ObjectId) -> bool {
        if self.object(target).is_none() {
            return false;
        }
        if let Some(previous) = self.rune_holder.filter(|previous| *previous != target) {
            if let Some(object) = self.object_mut(previous) {
                object.has_rune = false;
            }
        }
        if let Some(object) = self.object_mut(target) {
            object.has_rune = true;
        }
        self.rune_holder = Some(target);
        true
    }

    /// Clears the current holder, returning it. No-op without a holder.
    pub fn remove_rune(&mut self) -> Option<ObjectId> {
        let previous = self.rune_holder.take()?;
        if let Some(object) = self.object_mut(previous) {
            object.has_rune = false;
        }
        Some(previous)
    }

    /// Moves the rune to a different object of the active hall.
    ///
    /// Draws at most [`TRANSFER_ATTEMPTS`] random candidates and gives up
    /// silently when none of them is rune-free. A rune that has been removed
    /// or collected is never re-placed.
    pub fn transfer_rune<R>(&mut self, rng: &mut R) -> Option<RuneTransfer>
    where
        R: Rng + ?Sized,
    {
        let from = self.rune_holder?;
        let hall = self.active_hall;
        let count = self.objects_for_hall(hall).len();
        if count == 0 {
            return None;
        }

        for _ in 0..TRANSFER_ATTEMPTS {
            let candidate = ObjectId::new(hall, rng.gen_range(0..count));
            let free = self
                .object(candidate)
                .is_some_and(|object| !object.has_rune);
            if free && self.set_rune(candidate) {
                debug!(?from, to = ?candidate, "rune transferred");
                return Some(RuneTransfer {
                    from: Some(from),
                    to: candidate,
                });
            }
        }

        debug!(%hall, "rune transfer found no free candidate");
        None
    }

    /// Re-derives the single-rune guarantee across all halls.
    pub fn check_invariant(&self) -> Result<(), InvariantViolation> {
        let flagged: Vec<ObjectId> = self
            .halls
            .iter()
            .flat_map(|(hall, objects)| {
                objects
                    .iter()
                    .enumerate()
                    .filter(|(_, object)| object.has_rune)
                    .map(move |(index, _)| ObjectId::new(*hall, index))
            })
            .collect();

        if flagged.len() > 1 {
            return Err(InvariantViolation::MultipleHolders {
                count: flagged.len(),
            });
        }

        let flagged = flagged.first().copied();
        if flagged != self.rune_holder {
            return Err(InvariantViolation::HolderMismatch {
                tracked: self.rune_holder,
                flagged,
            });
        }
        Ok(())
    }

    /// Routes a click to the objects of the active hall.
    ///
    /// Clicking the rune holder within reach moves the rune into the player's
    /// inventory. Clicking a rune-free object within reach highlights it for
    /// [`ACKNOWLEDGEMENT_SECS`]. Reach is measured as the axis-aligned pixel
    /// distance between the player and the object's tile centre.
    pub fn handle_click(
        &mut self,
        click: PixelPoint,
        tile_length: f32,
        player: &mut Player,
        now: GameTime,
        out: &mut Vec<Event>,
    ) -> ClickOutcome {
        let hall = self.active_hall;
        let reach = INTERACTION_REACH_TILES * tile_length;

        let hit = self
            .objects_for_hall(hall)
            .iter()
            .position(|object| object.cell().bounds_contain(click, tile_length));
        let Some(index) = hit else {
            return ClickOutcome::Missed;
        };

        let id = ObjectId::new(hall, index);
        let Some(object) = self.object(id) else {
            return ClickOutcome::Missed;
        };
        let holds_rune = object.has_rune;
        let centre = object.cell().center(tile_length);
        if player.position().manhattan_distance_to(centre) > reach {
            return ClickOutcome::OutOfReach(id);
        }

        if holds_rune {
            let _ = self.remove_rune();
            player.inventory_mut().add(EnchantmentKind::Rune);
            debug!(object = ?id, "rune collected");
            out.push(Event::RuneCollected { from: id });
            ClickOutcome::RuneCollected(id)
        } else {
            let until = now.after(ACKNOWLEDGEMENT_SECS);
            self.acknowledgement = Some(Acknowledgement { object: id, until });
            out.push(Event::ObjectAcknowledged { object: id, until });
            ClickOutcome::Acknowledged(id)
        }
    }

    /// Object currently highlighted after a rune-free click, if still showing.
    #[must_use]
    pub fn acknowledged(&self, now: GameTime) -> Option<ObjectId> {
        self.acknowledgement
            .filter(|acknowledgement| now < acknowledgement.until)
            .map(|acknowledgement| acknowledgement.object)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut BuildObject> {
        self.halls
            .get_mut(&id.hall())
            .and_then(|objects| objects.get_mut(id.index()))
    }
}

impl RuneRelocator for BuildObjectRegistry {
    fn relocate_rune(&mut self, rng: &mut dyn RngCore) -> Option<RuneTransfer> {
        self.transfer_rune(rng)
    }
}
