//! Squad integration tests: the controller playing whole arena games

use grush_crusher::ai::{SquadAI, SquadCommander};
use grush_crusher::core::{BotConfig, Command, GoldAssignment};
use grush_crusher::sim::{Arena, ArenaConfig};

fn small_arena() -> ArenaConfig {
    ArenaConfig {
        size: 8,
        players: 2,
        agents: 4,
        wall_density: 0.0,
        gold_deposits: 6,
        gold_per_deposit: 3,
        vision_range: None,
    }
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        let mut arena = Arena::generate(ArenaConfig::default(), 1234).unwrap();
        let mut commander =
            SquadCommander::with_seed(arena.setup(200), BotConfig::default(), 1234).unwrap();
        let stats = arena.run(&mut commander, 200);
        (stats, arena.agents().to_vec())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_squad_delivers_gold() {
    // the arena always reports on_gold, so exhausted deposits can be dropped
    let config = BotConfig {
        camper_fraction: 0.0,
        clear_failed_deposits: true,
        ..BotConfig::default()
    };
    let mut arena = Arena::generate(small_arena(), 5).unwrap();
    let mut commander = SquadCommander::with_seed(arena.setup(400), config, 5).unwrap();

    let stats = arena.run(&mut commander, 400);
    assert_eq!(stats.failed_ticks, 0);
    assert!(stats.gold_delivered > 0);
    assert_eq!(stats.gold_delivered + stats.gold_remaining + carried(&arena), 18);
}

#[test]
fn test_deposit_strategy_also_delivers() {
    let config = BotConfig {
        camper_fraction: 0.0,
        clear_failed_deposits: true,
        gold_assignment: GoldAssignment::ClosestToBase,
        ..BotConfig::default()
    };
    let mut arena = Arena::generate(small_arena(), 9).unwrap();
    let mut commander = SquadCommander::with_seed(arena.setup(400), config, 9).unwrap();

    let stats = arena.run(&mut commander, 400);
    assert_eq!(stats.failed_ticks, 0);
    assert!(stats.gold_delivered > 0);
}

#[test]
fn test_every_tick_yields_one_command_per_agent() {
    let mut arena = Arena::generate(ArenaConfig::default(), 77).unwrap();
    let mut commander =
        SquadCommander::with_seed(arena.setup(100), BotConfig::default(), 77).unwrap();

    let stats = arena.run(&mut commander, 100);
    let issued: u64 = stats.command_counts.values().sum();
    assert_eq!(issued, 100 * arena.agents().len() as u64);
    assert_eq!(stats.failed_ticks, 0);
}

#[test]
fn test_no_fire_without_enemies() {
    let mut arena = Arena::generate(ArenaConfig::default(), 3).unwrap();
    let mut commander =
        SquadCommander::with_seed(arena.setup(150), BotConfig::default(), 3).unwrap();

    let stats = arena.run(&mut commander, 150);
    assert!(!stats.command_counts.contains_key(Command::Fire.name()));
}

#[test]
fn test_knowledge_grows_while_playing() {
    let mut arena = Arena::generate(ArenaConfig::default(), 21).unwrap();
    let mut commander =
        SquadCommander::with_seed(arena.setup(100), BotConfig::default(), 21).unwrap();

    let before = commander.map().fog_fraction();
    arena.run(&mut commander, 100);
    assert!(commander.map().fog_fraction() < before);
    assert_eq!(commander.tick(), 100);
}

#[test]
fn test_camps_planned_during_play() {
    let config = BotConfig {
        camper_fraction: 0.5,
        camp_interval: 10,
        ..BotConfig::default()
    };
    let mut arena = Arena::generate(small_arena(), 5).unwrap();
    let mut commander = SquadCommander::with_seed(arena.setup(200), config, 5).unwrap();

    arena.run(&mut commander, 200);
    for camp in commander.camps() {
        assert!(commander.map().in_bounds(camp.cell));
    }
}

fn carried(arena: &Arena) -> u32 {
    arena.agents().iter().filter(|a| a.has_gold).count() as u32
}
