//! Scripted player that searches the active hall one object per second.

use rune_hall_core::Event;
use rune_hall_session::{FrameInput, Session};
use rune_hall_world::query;

/// Walks onto each build object of the active hall in turn and clicks it.
///
/// A new target is picked on the first frame and after every clock tick, so
/// the player inspects at most one object per in-game second.
#[derive(Debug)]
pub(crate) struct Autopilot {
    visited: usize,
    ready: bool,
}

impl Autopilot {
    pub(crate) fn new() -> Self {
        Self {
            visited: 0,
            ready: true,
        }
    }

    /// Restarts the sweep, for a freshly entered hall.
    pub(crate) fn restart(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn input(&mut self, session: &Session) -> FrameInput {
        if !self.ready {
            return FrameInput::default();
        }
        self.ready = false;

        let world = session.world();
        let objects = query::objects(world).objects_for_hall(query::hall(world));
        if objects.is_empty() {
            return FrameInput::default();
        }
        let target = objects[self.visited % objects.len()].cell();
        self.visited += 1;

        let centre = target.center(query::collision_map(world).tile_length());
        FrameInput {
            player_position: Some(centre),
            click: Some(centre),
            ..FrameInput::default()
        }
    }

    pub(crate) fn observe(&mut self, events: &[Event]) {
        if events
            .iter()
            .any(|event| matches!(event, Event::ClockTicked { .. }))
        {
            self.ready = true;
        }
    }
}
