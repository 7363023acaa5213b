//! Mirror synchronization, autosave and load-resume tests.

use skirmish_core::config::SimulationConfig;
use skirmish_core::math::Fixed;
use skirmish_core::movement::MovementIntent;
use skirmish_core::registry::{Allegiance, UnitId};
use skirmish_core::simulation::Simulation;
use skirmish_core::snapshot::{GameStateData, SnapshotStore};
use skirmish_test_utils::fixtures::{dummy, ground, rifleman, skirmisher, spawn, MemoryStore};

fn battle() -> (Simulation, UnitId, UnitId) {
    let mut sim = Simulation::default();
    let a = spawn(&mut sim, Allegiance::Player, ground(0, 0), rifleman());
    let b = spawn(&mut sim, Allegiance::Enemy, ground(6, 0), rifleman());
    (sim, a, b)
}

#[test]
fn synchronize_is_idempotent_while_paused() {
    let (mut sim, _, _) = battle();
    for _ in 0..30 {
        sim.tick();
    }

    sim.synchronize();
    let first = sim.snapshot();
    sim.synchronize();
    let second = sim.snapshot();
    assert_eq!(first, second);
}

#[test]
fn mirror_follows_live_state() {
    let (mut sim, a, b) = battle();
    let destination = ground(-10, 4);
    sim.issue_move(a, destination).unwrap();
    sim.set_target(b, a).unwrap();
    sim.synchronize();

    let record = sim.synchronizer().get(a).unwrap();
    let command = record.movement_command.unwrap();
    assert_eq!(command.target_position.x, -10.0);
    assert_eq!(command.target_position.z, 4.0);
    assert_eq!(command.speed, 3.5);
    assert_eq!(record.unit_type, Allegiance::Player);
    assert_eq!(record.unit_name, "Rifleman");
    assert_eq!(record.max_health, 100);

    let enemy = sim.synchronizer().get(b).unwrap();
    assert_eq!(enemy.attack_command.unwrap().target_unit_id, a);

    let players: Vec<_> = sim.synchronizer().by_allegiance(Allegiance::Player).collect();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].unit_id, a);
}

#[test]
fn dead_units_leave_the_mirror() {
    let mut sim = Simulation::default();
    let a = spawn(&mut sim, Allegiance::Player, ground(0, 0), skirmisher(50, 0, 2, 1));
    let b = spawn(&mut sim, Allegiance::Enemy, ground(1, 0), dummy(10, 0));
    sim.set_target(a, b).unwrap();
    sim.synchronize();
    assert_eq!(sim.synchronizer().len(), 2);

    let events = sim.tick();
    assert_eq!(events.deaths, vec![b]);
    assert!(sim.synchronizer().get(b).is_none());
    assert_eq!(sim.synchronize(), 0);
    assert!(sim.synchronizer().get(a).unwrap().attack_command.is_none());
}

#[test]
fn autosave_fires_every_ten_seconds() {
    let (mut sim, _, _) = battle();
    let mut store = MemoryStore::new();
    let mut due_at = Vec::new();
    for _ in 0..600 {
        if sim.tick().save_due {
            due_at.push(sim.now());
            store.save(&sim.save_state()).unwrap();
        }
    }
    assert_eq!(due_at, vec![200, 400, 600]);
    assert_eq!(store.saves, 3);
    assert!((store.load().unwrap().game_time - 30.0).abs() < 0.01);
}

#[test]
fn custom_save_interval_is_respected() {
    let config = SimulationConfig {
        save_interval: Fixed::from_num(0.5),
        ..SimulationConfig::default()
    };
    let mut sim = Simulation::new(config);
    let fired = (0..40).filter(|_| sim.tick().save_due).count();
    assert_eq!(fired, 4);
}

#[test]
fn loading_resumes_in_flight_commands() {
    let (mut sim, a, b) = battle();
    sim.issue_move(a, ground(30, 0)).unwrap();
    sim.set_target(a, b).unwrap();
    let saved = sim.save_state();

    let json = serde_json::to_string_pretty(&saved).unwrap();
    assert!(json.contains("\"unit_type\": \"player\""));
    let reloaded: GameStateData = serde_json::from_str(&json).unwrap();

    let (mut fresh, fa, fb) = battle();
    assert_eq!((fa, fb), (a, b));
    let resumed = fresh.load_state(reloaded);

    assert_eq!(resumed, 2);
    assert_eq!(fresh.unit(a).unwrap().movement, MovementIntent::Commanded(ground(30, 0)));
    assert_eq!(fresh.unit(a).unwrap().target(), Some(b));
    assert!(fresh.unit(b).unwrap().stats.has_death_subscriber(a));
    assert!(fresh.stale_references().is_empty());
}

#[test]
fn loading_records_for_missing_units_is_harmless() {
    let (mut sim, a, b) = battle();
    sim.set_target(a, b).unwrap();
    let saved = sim.save_state();

    let mut lone = Simulation::default();
    let only = spawn(&mut lone, Allegiance::Enemy, ground(0, 0), rifleman());
    assert_eq!(only, a);

    // `a` is live in the new simulation but `b` is not: nothing to resume.
    assert_eq!(lone.load_state(saved), 0);
    assert_eq!(lone.unit(a).unwrap().target(), None);
    assert_eq!(lone.synchronize(), 1);
    assert_eq!(lone.synchronizer().len(), 1);
    assert_eq!(lone.synchronizer().get(a).unwrap().unit_type, Allegiance::Enemy);
}

#[test]
fn failing_store_leaves_simulation_untouched() {
    let (mut sim, _, _) = battle();
    let mut store = MemoryStore::failing();
    let before = sim.state_hash();
    assert!(store.save(&sim.save_state()).is_err());
    assert!(store.load().is_err());
    assert_eq!(sim.state_hash(), before);
}
