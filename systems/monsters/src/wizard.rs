//! Wizard strategy machine keyed on the remaining-time ratio.

use rand::RngCore;
use rune_hall_core::{ClockReading, Event, MonsterId, WizardStrategy};
use tracing::debug;

use crate::{monster::WizardState, Config, MonsterContext};

/// Advances a wizard by one tick. Returns `true` when the wizard should vanish.
///
/// The bracket is re-evaluated on every tick; entering a bracket restarts the
/// strategy timer and the relocation timer.
pub(crate) fn update(
    config: &Config,
    id: MonsterId,
    state: &mut WizardState,
    reading: ClockReading,
    ctx: &mut MonsterContext<'_>,
    rng: &mut dyn RngCore,
    out: &mut Vec<Event>,
) -> bool {
    let now = reading.now;
    let bracket = WizardStrategy::for_ratio(reading.ratio_percent());
    if state.strategy != Some(bracket) {
        state.strategy = Some(bracket);
        state.strategy_start = now;
        state.last_rune_transfer = now;
        debug!(id = id.get(), strategy = ?bracket, "wizard strategy changed");
        out.push(Event::WizardStrategyChanged {
            id,
            strategy: bracket,
        });
    }

    match bracket {
        WizardStrategy::High => {
            if now.since(state.last_rune_transfer) >= config.wizard_transfer_interval_secs {
                state.last_rune_transfer = now;
                if let Some(transfer) = ctx.runes.relocate_rune(rng) {
                    out.push(Event::RuneTransferred {
                        from: transfer.from,
                        to: transfer.to,
                    });
                }
            }
            false
        }
        WizardStrategy::Mid => now.since(state.strategy_start) >= config.wizard_linger_secs,
        WizardStrategy::Low => match state.teleported_at {
            Some(at) => now.since(at) >= config.wizard_vanish_delay_secs,
            None => {
                let due = now.since(state.strategy_start) >= config.wizard_teleport_delay_secs;
                if due && teleport_player(config, id, ctx, rng, out) {
                    state.teleported_at = Some(now);
                }
                false
            }
        },
    }
}

// A failed search leaves the wizard waiting; it retries on the next tick.
fn teleport_player(
    config: &Config,
    id: MonsterId,
    ctx: &mut MonsterContext<'_>,
    rng: &mut dyn RngCore,
    out: &mut Vec<Event>,
) -> bool {
    let occupancy = ctx.occupancy;
    let Some(cell) = ctx
        .map
        .find_open_cell(rng, config.placement_attempts, |cell| {
            occupancy.is_location_available(cell)
        })
    else {
        debug!(id = id.get(), "wizard found no teleport destination");
        return false;
    };
    ctx.player.set_position(cell.center(ctx.map.tile_length()));
    debug!(id = id.get(), column = cell.column(), row = cell.row(), "player teleported");
    out.push(Event::PlayerTeleported { source: id, to: cell });
    true
}
