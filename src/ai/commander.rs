//! Squad commander - the per-tick decision pipeline
//!
//! Every tick runs a fixed sequence of heuristic passes over one command
//! slot per agent. A pass only fills slots that are still empty, so pass
//! order is precedence order. Within a pass agents are handled in roster
//! order; moves reserve their destination in the occupancy grid and later
//! agents see those reservations.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::ai::camp::{camp_target, guard_locations, preferred_facings, CampAssignment};
use crate::ai::routing::route;
use crate::ai::SquadAI;
use crate::core::config::{BotConfig, GoldAssignment};
use crate::core::error::{BotError, Result};
use crate::core::types::{Cell, Command, Facing, GameSetup, Tick, Tile};
use crate::map::world_map::WorldMap;

/// Commands of the fallback distribution, in `FallbackWeights::as_array` order
pub const FALLBACK_COMMANDS: [Command; 5] = [
    Command::Go,
    Command::RotateLeft,
    Command::RotateRight,
    Command::RotateBack,
    Command::Mine,
];

const WANDER_COMMANDS: [Command; 4] = [
    Command::Go,
    Command::RotateLeft,
    Command::RotateRight,
    Command::RotateBack,
];

const LEAVE_BASE_TARGET_ATTEMPTS: usize = 64;

/// Squad controller implementing `SquadAI`
pub struct SquadCommander {
    setup: GameSetup,
    config: BotConfig,
    map: WorldMap,
    agents: Vec<Agent>,
    camps: Vec<CampAssignment>,
    /// Agents carrying gold at the last update
    active_miners: usize,
    /// Cells where `Mine` was ordered last tick
    mined_cells: Vec<Cell>,
    tick: Tick,
    last_camp_tick: Option<Tick>,
    fallback: WeightedIndex<f64>,
    rng: StdRng,
}

impl SquadCommander {
    /// Create a commander, seeded from the config or from entropy
    pub fn new(setup: GameSetup, config: BotConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_seed(setup, config, seed)
    }

    /// Create with a specific RNG seed for deterministic behavior
    pub fn with_seed(setup: GameSetup, config: BotConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let fallback = WeightedIndex::new(config.fallback.as_array())
            .map_err(|e| BotError::Config(format!("fallback weights: {}", e)))?;
        let map = WorldMap::new(setup.size, setup.my_base, &setup.enemy_bases);

        Ok(Self {
            setup,
            config,
            map,
            agents: Vec::new(),
            camps: Vec::new(),
            active_miners: 0,
            mined_cells: Vec::new(),
            tick: 0,
            last_camp_tick: None,
            fallback,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut WorldMap {
        &mut self.map
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn camps(&self) -> &[CampAssignment] {
        &self.camps
    }

    /// Replace the guard posts until the next planning run
    pub fn set_camps(&mut self, camps: Vec<CampAssignment>) {
        self.camps = camps;
    }

    /// Number of updates processed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Is exploring still worth it against this many competitors?
    pub fn should_explore(&self) -> bool {
        self.map.fog_fraction() * self.config.explore_weight
            > 1.0 / self.setup.player_count.max(1) as f32
    }

    /// Drop deposits that yielded nothing to last tick's miners
    fn forget_failed_deposits(&mut self) {
        for agent in &self.agents {
            if agent.has_gold || agent.on_gold || !self.mined_cells.contains(&agent.cell) {
                continue;
            }
            if self.map.tile(agent.cell) == Some(Tile::Gold) {
                self.map.set_tile(agent.cell, Tile::Empty);
                debug!("deposit at {} came up empty, forgetting it", agent.cell);
            }
        }
    }

    /// Re-run guard placement when the interval has elapsed
    fn plan_camps(&mut self) {
        if self.config.camper_fraction <= 0.0 {
            return;
        }
        let due = match self.last_camp_tick {
            None => true,
            Some(last) => self.tick >= last + self.config.camp_interval,
        };
        if !due {
            return;
        }

        let base = self.setup.my_base;
        let Some(target) = camp_target(&self.map, base) else {
            return;
        };
        let facings = preferred_facings(base, self.setup.size);
        self.camps = guard_locations(&self.map, target, &facings, self.config.guard_perimeter);
        self.last_camp_tick = Some(self.tick);

        info!(
            "tick {}: guarding {} with {} post(s)",
            self.tick,
            target,
            self.camps.len()
        );
    }

    /// Carriers head home, nearest to base first
    fn retreat_pass(&mut self, slots: &mut [Option<Command>]) -> Result<()> {
        let base = self.setup.my_base;
        let mut order: Vec<usize> = (0..self.agents.len())
            .filter(|&i| self.agents[i].has_gold)
            .collect();
        order.sort_by_key(|&i| self.agents[i].cell.distance(&base));

        for i in order {
            if slots[i].is_some() {
                continue;
            }
            let agent = &self.agents[i];
            slots[i] = route(&mut self.map, agent, base)?;
            debug!("agent {} retreats with gold: {:?}", i, slots[i]);
        }
        Ok(())
    }

    /// Shoot whatever enemy is in sight unless carrying
    fn combat_pass(&self, slots: &mut [Option<Command>]) {
        for (i, (slot, agent)) in slots.iter_mut().zip(&self.agents).enumerate() {
            if slot.is_none() && agent.vision.tile == Tile::Enemy && !agent.has_gold {
                *slot = Some(Command::Fire);
                debug!("agent {} fires at enemy {} away", i, agent.vision.distance);
            }
        }
    }

    /// Mine while under the miner cap
    ///
    /// Agents the game reports on gold go first, then agents standing on
    /// known deposits, deposits nearest to base first.
    fn mining_pass(&self, slots: &mut [Option<Command>]) {
        let base = self.setup.my_base;
        let eligible = |i: usize| slots[i].is_none() && !self.agents[i].has_gold;

        let mut candidates: Vec<usize> = (0..self.agents.len())
            .filter(|&i| eligible(i) && self.agents[i].on_gold)
            .collect();
        let mut on_known_gold: Vec<usize> = (0..self.agents.len())
            .filter(|&i| {
                let agent = &self.agents[i];
                eligible(i) && !agent.on_gold && self.map.tile(agent.cell) == Some(Tile::Gold)
            })
            .collect();
        on_known_gold.sort_by_key(|&i| self.agents[i].cell.distance(&base));
        candidates.extend(on_known_gold);

        let mut miners = self.active_miners;
        for i in candidates {
            if miners >= self.config.miner_cap {
                break;
            }
            slots[i] = Some(Command::Mine);
            miners += 1;
            debug!("agent {} mines at {}", i, self.agents[i].cell);
        }
    }

    /// Send idle agents after known gold
    fn seek_gold_pass(&mut self, slots: &mut [Option<Command>]) -> Result<()> {
        let base = self.setup.my_base;
        let golds: Vec<Cell> = self
            .map
            .find_all(Tile::Gold)
            .into_iter()
            .filter(|cell| *cell != base)
            .collect();
        if golds.is_empty() {
            return Ok(());
        }

        match self.config.gold_assignment {
            GoldAssignment::Nearest => self.seek_nearest_gold(slots, &golds),
            GoldAssignment::ClosestToBase => self.seek_gold_by_deposit(slots, golds),
        }
    }

    fn seek_nearest_gold(&mut self, slots: &mut [Option<Command>], golds: &[Cell]) -> Result<()> {
        let cap = self.config.seek_gold_cap.unwrap_or(usize::MAX);
        let mut dispatched = 0;

        for i in 0..self.agents.len() {
            if dispatched >= cap {
                break;
            }
            let agent = &self.agents[i];
            if slots[i].is_some() || agent.has_gold {
                continue;
            }

            let target = if self.rng.gen_bool(self.config.random_gold_chance) {
                golds.choose(&mut self.rng).copied()
            } else {
                nearest_of(golds, agent.cell)
            };
            let Some(target) = target else {
                continue;
            };

            if let Some(command) = route(&mut self.map, agent, target)? {
                slots[i] = Some(command);
                dispatched += 1;
                debug!("agent {} heads for gold at {}: {}", i, target, command);
            }
        }
        Ok(())
    }

    fn seek_gold_by_deposit(&mut self, slots: &mut [Option<Command>], mut golds: Vec<Cell>) -> Result<()> {
        let base = self.setup.my_base;
        golds.sort_by_key(|gold| gold.distance(&base));
        let limit = self
            .config
            .seek_gold_cap
            .unwrap_or(usize::MAX)
            .min(2 * self.config.miner_cap);

        let mut claimed = vec![false; self.agents.len()];
        for gold in golds.into_iter().take(limit) {
            let best = (0..self.agents.len())
                .filter(|&i| slots[i].is_none() && !claimed[i] && !self.agents[i].has_gold)
                .min_by_key(|&i| self.agents[i].cell.distance(&gold));
            let Some(i) = best else {
                break;
            };

            claimed[i] = true;
            slots[i] = route(&mut self.map, &self.agents[i], gold)?;
            debug!("agent {} claims deposit {}: {:?}", i, gold, slots[i]);
        }
        Ok(())
    }

    /// Look toward unseen cells, or walk to the nearest one
    fn explore_pass(&mut self, slots: &mut [Option<Command>]) -> Result<()> {
        for i in 0..self.agents.len() {
            let agent = &self.agents[i];
            if slots[i].is_some() {
                continue;
            }

            if let Some(facing) = fog_facing(&self.map, agent) {
                slots[i] = agent.turn_towards(facing);
                debug!("agent {} turns {} to scout", i, facing);
                continue;
            }

            let Some((fog, _)) = self.map.find_nearest(agent.cell, Tile::Fog) else {
                continue;
            };
            slots[i] = route(&mut self.map, agent, fog)?;
            debug!("agent {} explores toward {}: {:?}", i, fog, slots[i]);
        }
        Ok(())
    }

    /// Push idle agents out of the crowded area around base
    fn leave_base_pass(&mut self, slots: &mut [Option<Command>]) -> Result<()> {
        let base = self.setup.my_base;
        let perimeter = self.config.leave_perimeter;

        for i in 0..self.agents.len() {
            let agent = &self.agents[i];
            if slots[i].is_some() || agent.has_gold || agent.cell.distance(&base) > perimeter {
                continue;
            }

            if self.rng.gen_bool(self.config.leave_base_wander_chance) {
                slots[i] = WANDER_COMMANDS.choose(&mut self.rng).copied();
                continue;
            }

            let Some(target) = random_cell_outside(&self.map, &mut self.rng, base, perimeter) else {
                continue;
            };
            slots[i] = route(&mut self.map, agent, target)?;
            debug!("agent {} leaves base toward {}: {:?}", i, target, slots[i]);
        }
        Ok(())
    }

    /// Hold guard posts, then fill free posts with the nearest idle agents
    ///
    /// Holders and dispatched agents share one cap of
    /// `floor(camper_fraction * roster)`.
    fn camp_pass(&mut self, slots: &mut [Option<Command>]) -> Result<()> {
        if self.camps.is_empty() {
            return Ok(());
        }

        let cap = (self.config.camper_fraction * self.agents.len() as f32).floor() as usize;
        let mut campers = 0;

        for i in 0..self.agents.len() {
            if campers >= cap {
                break;
            }
            if slots[i].is_some() {
                continue;
            }
            let agent = &self.agents[i];
            if let Some(camp) = self.camps.iter().find(|c| c.cell == agent.cell) {
                // loiter in place once facing the right way
                slots[i] = Some(agent.turn_towards(camp.facing).unwrap_or(Command::Mine));
                campers += 1;
            }
        }

        let mut dispatched = vec![false; self.agents.len()];
        let camps = self.camps.clone();

        for camp in camps {
            if campers >= cap {
                break;
            }
            if self.map.occupant(camp.cell) == Some(Tile::Ally) {
                continue;
            }
            let best = (0..self.agents.len())
                .filter(|&i| slots[i].is_none() && !dispatched[i] && !self.agents[i].has_gold)
                .min_by_key(|&i| self.agents[i].cell.distance(&camp.cell));
            let Some(i) = best else {
                break;
            };

            dispatched[i] = true;
            campers += 1;
            slots[i] = route(&mut self.map, &self.agents[i], camp.cell)?;
            debug!("agent {} heads to guard post {}: {:?}", i, camp.cell, slots[i]);
        }
        Ok(())
    }

    /// Collapse remaining empty slots with weighted-random commands
    ///
    /// A sampled `Go` is only kept if the cell ahead is free; it then
    /// reserves that cell like a routed move. Otherwise the agent turns.
    fn fallback_pass(&mut self, slots: Vec<Option<Command>>) -> Vec<Command> {
        let mut commands = Vec::with_capacity(slots.len());
        for (i, slot) in slots.into_iter().enumerate() {
            if let Some(command) = slot {
                commands.push(command);
                continue;
            }

            let agent = &self.agents[i];
            let mut command = FALLBACK_COMMANDS[self.fallback.sample(&mut self.rng)];
            if command == Command::Go {
                match self.map.forward_cell(agent.cell, agent.facing) {
                    Some(ahead) if self.map.is_free(ahead) && self.map.tile(ahead) != Some(Tile::Wall) => {
                        self.map.reserve(ahead);
                    }
                    _ => {
                        command = if self.rng.gen_bool(0.5) {
                            Command::RotateLeft
                        } else {
                            Command::RotateRight
                        };
                    }
                }
            }
            debug!("agent {} falls back to {}", i, command);
            commands.push(command);
        }
        commands
    }
}

impl SquadAI for SquadCommander {
    fn update(&mut self, agents: Vec<Agent>) {
        self.tick += 1;
        self.map.update(&agents);
        self.active_miners = agents.iter().filter(|a| a.has_gold).count();
        self.agents = agents;
        if self.config.clear_failed_deposits {
            self.forget_failed_deposits();
        }
        self.plan_camps();
    }

    #[tracing::instrument(level = "debug", skip_all, fields(tick = self.tick, agents = self.agents.len()))]
    fn decide(&mut self) -> Result<Vec<Command>> {
        let mut slots: Vec<Option<Command>> = vec![None; self.agents.len()];

        self.retreat_pass(&mut slots)?;
        self.combat_pass(&mut slots);
        self.mining_pass(&mut slots);
        self.seek_gold_pass(&mut slots)?;
        if self.should_explore() {
            self.explore_pass(&mut slots)?;
        }
        if self.config.leave_base {
            self.leave_base_pass(&mut slots)?;
        }
        self.camp_pass(&mut slots)?;

        let commands = self.fallback_pass(slots);
        self.mined_cells = self
            .agents
            .iter()
            .zip(&commands)
            .filter(|(_, command)| **command == Command::Mine)
            .map(|(agent, _)| agent.cell)
            .collect();
        Ok(commands)
    }

    fn config(&self) -> &BotConfig {
        &self.config
    }
}

/// Closest cell by Manhattan distance, first in list order on ties
fn nearest_of(cells: &[Cell], origin: Cell) -> Option<Cell> {
    cells.iter().copied().min_by_key(|cell| cell.distance(&origin))
}

/// Distance to the first fog along a ray, if nothing blocks the view first
fn fog_distance(map: &WorldMap, origin: Cell, facing: Facing) -> Option<usize> {
    for (i, (_, tile)) in map.ray(origin, facing, None).into_iter().enumerate() {
        match tile {
            Tile::Fog => return Some(i + 1),
            Tile::Empty => continue,
            _ => return None,
        }
    }
    None
}

/// Other facing that would bring the nearest fog into view
///
/// Ties prefer fewer rotations, then facing order.
fn fog_facing(map: &WorldMap, agent: &Agent) -> Option<Facing> {
    Facing::ALL
        .into_iter()
        .filter(|facing| *facing != agent.facing)
        .filter_map(|facing| fog_distance(map, agent.cell, facing).map(|d| (facing, d)))
        .min_by_key(|(facing, distance)| (*distance, agent.facing.turns_to(*facing), facing.index()))
        .map(|(facing, _)| facing)
}

/// Random non-wall cell further than `perimeter` from `base`
fn random_cell_outside(map: &WorldMap, rng: &mut StdRng, base: Cell, perimeter: usize) -> Option<Cell> {
    let size = map.size();
    if size == 0 {
        return None;
    }
    for _ in 0..LEAVE_BASE_TARGET_ATTEMPTS {
        let cell = Cell::new(rng.gen_range(0..size), rng.gen_range(0..size));
        if cell.distance(&base) > perimeter && map.tile(cell) != Some(Tile::Wall) {
            return Some(cell);
        }
    }
    None
}
