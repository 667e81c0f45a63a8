//! Turn a route into this tick's command, reserving the destination

use tracing::debug;

use crate::agent::Agent;
use crate::core::error::Result;
use crate::core::types::{Cell, Command};
use crate::map::world_map::WorldMap;
use crate::pathing::pathfinding::{next_step, Pose};

/// Command moving `agent` one action closer to `target`
///
/// `Ok(None)` when the agent already stands on the target, no route
/// exists, or the next cell is taken this tick (a stall). A `Go` marks its
/// destination `Reserved` so agents routed later this tick avoid it.
pub fn route(map: &mut WorldMap, agent: &Agent, target: Cell) -> Result<Option<Command>> {
    let start = Pose::new(agent.cell, agent.facing);
    let Some(step) = next_step(map, start, target)? else {
        return Ok(None);
    };

    let facing = agent.facing_for_step(step)?;
    if facing != agent.facing {
        return Ok(agent.turn_towards(facing));
    }

    if !map.is_free(step) {
        debug!("agent at {} stalls: {} is taken", agent.cell, step);
        return Ok(None);
    }

    map.reserve(step);
    Ok(Some(Command::Go))
}
