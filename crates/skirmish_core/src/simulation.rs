//! Simulation context and tick loop.
//!
//! The [`Simulation`] owns every unit, the registry, the snapshot mirror,
//! the selection index and the navigator. It is the single dispatch point
//! for registry notifications and the only place a sensor transition is
//! turned into a death subscribe/unsubscribe.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::clock::SimClock;
use crate::combat::{AttackResult, CombatResolver, TargetMut};
use crate::config::SimulationConfig;
use crate::controller::PathAction;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec3Fixed};
use crate::movement::{DirectNavigator, Navigator};
use crate::proximity::{ProximityEvent, ProximityTracker};
use crate::registry::{Registry, RegistryEvent, RegistryObserver, UnitId};
use crate::selection::SelectionIndex;
use crate::sensor::SensorTransition;
use crate::snapshot::{AutosaveTimer, GameStateData, StateSynchronizer};
use crate::stats::HealthChange;
use crate::unit::{Unit, UnitSpawnParams, UnitStorage};

/// A landed attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackEvent {
    /// Attacking unit.
    pub attacker: UnitId,
    /// Unit that was hit.
    pub target: UnitId,
    /// Health change on the target.
    pub change: HealthChange,
}

/// Events generated during a simulation tick.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Attacks that landed.
    pub attacks: Vec<AttackEvent>,
    /// Units that died and were removed.
    pub deaths: Vec<UnitId>,
    /// Units whose move command completed.
    pub arrivals: Vec<UnitId>,
    /// The autosave interval elapsed this tick.
    pub save_due: bool,
}

/// The combat simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Movement** - navigator advances units, commands poll for arrival
/// 2. **Proximity** - trigger overlaps update sensors (exits before enters)
/// 3. **Controllers** - per unit in id order: range check, path or halt,
///    face, attack. A kill is fully resolved before the next unit runs.
/// 4. **Clock** - tick and game time advance, autosave timer polled
#[derive(Debug, Clone)]
pub struct Simulation<N: Navigator = DirectNavigator> {
    clock: SimClock,
    config: SimulationConfig,
    repath_interval_ticks: u64,
    units: UnitStorage,
    registry: Registry,
    synchronizer: StateSynchronizer,
    selection: SelectionIndex,
    proximity: ProximityTracker,
    navigator: N,
    autosave: AutosaveTimer,
}

impl Simulation<DirectNavigator> {
    /// Create an empty simulation with the straight-line navigator.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let navigator = DirectNavigator::new(config.stopping_distance);
        Self::with_navigator(config, navigator)
    }
}

impl Default for Simulation<DirectNavigator> {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl<N: Navigator> Simulation<N> {
    /// Create an empty simulation with a custom navigator.
    pub fn with_navigator(config: SimulationConfig, navigator: N) -> Self {
        let clock = SimClock::new(config.tick_rate);
        let repath_interval_ticks = clock.seconds_to_ticks(config.ai_update_interval);
        let autosave = AutosaveTimer::new(clock.seconds_to_ticks(config.save_interval));
        Self {
            clock,
            config,
            repath_interval_ticks,
            units: UnitStorage::new(),
            registry: Registry::new(),
            synchronizer: StateSynchronizer::new(),
            selection: SelectionIndex::new(),
            proximity: ProximityTracker::new(),
            navigator,
            autosave,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current tick.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Simulation clock.
    #[must_use]
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Live units.
    #[must_use]
    pub const fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// A live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Unit registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Snapshot mirror.
    #[must_use]
    pub const fn synchronizer(&self) -> &StateSynchronizer {
        &self.synchronizer
    }

    /// Selection index.
    #[must_use]
    pub const fn selection(&self) -> &SelectionIndex {
        &self.selection
    }

    /// Mutable selection index.
    pub fn selection_mut(&mut self) -> &mut SelectionIndex {
        &mut self.selection
    }

    /// Navigator.
    #[must_use]
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Mutable navigator.
    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    fn require(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(id).ok_or_else(|| {
            tracing::warn!(%id, "operation on unknown unit skipped");
            GameError::UnitNotFound(id)
        })
    }

    fn require_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        match self.units.get_mut(id) {
            Some(unit) => Ok(unit),
            None => {
                tracing::warn!(%id, "operation on unknown unit skipped");
                Err(GameError::UnitNotFound(id))
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Spawn a unit with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Never fails for allocated ids; the `Result` mirrors
    /// [`spawn_unit_with_id`](Self::spawn_unit_with_id).
    pub fn spawn_unit(&mut self, params: UnitSpawnParams) -> Result<UnitId> {
        let id = self.registry.allocate_id();
        self.spawn_unit_with_id(id, params)
    }

    /// Spawn a unit under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DuplicateUnit`] if the id is live or belonged to
    /// a unit that has since been removed.
    pub fn spawn_unit_with_id(&mut self, id: UnitId, params: UnitSpawnParams) -> Result<UnitId> {
        let event = self.registry.register(id, params.allegiance)?;
        let unit = Unit::new(id, params, self.repath_interval_ticks);
        tracing::info!(%id, name = %unit.name, allegiance = %unit.allegiance, "unit spawned");
        self.units.insert(unit);
        self.dispatch(event);
        Ok(id)
    }

    /// Remove a live unit as if it had died.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is not live.
    pub fn despawn_unit(&mut self, id: UnitId) -> Result<()> {
        self.require(id)?;
        self.destroy_unit(id);
        Ok(())
    }

    /// Tear a unit down: death fan-out, subscription release, unregister.
    fn destroy_unit(&mut self, id: UnitId) {
        let Some(mut unit) = self.units.remove(id) else {
            return;
        };

        for subscriber in unit.stats.take_death_subscribers() {
            let Some(tracker) = self.units.get_mut(subscriber) else {
                continue;
            };
            if let SensorTransition::Released(_) = tracker.sensor.on_target_died(id) {
                tracing::debug!(%subscriber, target = %id, "target died; sensor idle");
                if !tracker.movement.is_commanded() {
                    self.navigator.cancel(subscriber);
                }
            }
        }

        if let Some(target) = unit.sensor.target() {
            if let Some(tracked) = self.units.get_mut(target) {
                tracked.stats.unsubscribe_death(id);
            }
        }

        self.navigator.forget(id);
        self.proximity.forget(id);
        if let Some(event) = self.registry.unregister(id) {
            self.dispatch(event);
        }
        tracing::info!(%id, name = %unit.name, "unit removed");
    }

    fn dispatch(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Registered { id, .. } => {
                let Some(unit) = self.units.get(id) else {
                    return;
                };
                self.synchronizer.unit_registered(unit);
                self.selection.unit_registered(unit);
            }
            RegistryEvent::Unregistered { id, allegiance } => {
                self.synchronizer.unit_unregistered(id, allegiance);
                self.selection.unit_unregistered(id, allegiance);
            }
        }
    }

    // ------------------------------------------------------------------
    // Targeting
    // ------------------------------------------------------------------

    fn apply_transition(&mut self, subscriber: UnitId, transition: SensorTransition) {
        match transition {
            SensorTransition::Unchanged => {}
            SensorTransition::Acquired(target) => {
                tracing::debug!(%subscriber, %target, "target acquired");
                self.subscribe(subscriber, target);
            }
            SensorTransition::Released(target) => {
                tracing::debug!(%subscriber, %target, "target released");
                self.unsubscribe(subscriber, target);
            }
            SensorTransition::Replaced { previous, current } => {
                tracing::debug!(%subscriber, %previous, %current, "target replaced");
                self.unsubscribe(subscriber, previous);
                self.subscribe(subscriber, current);
            }
        }
    }

    fn subscribe(&mut self, subscriber: UnitId, target: UnitId) {
        if let Some(tracked) = self.units.get_mut(target) {
            tracked.stats.subscribe_death(subscriber);
        }
    }

    fn unsubscribe(&mut self, subscriber: UnitId, target: UnitId) {
        if let Some(tracked) = self.units.get_mut(target) {
            tracked.stats.unsubscribe_death(subscriber);
        }
    }

    /// `other` entered `observer`'s proximity trigger.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if either unit is not live.
    pub fn proximity_enter(&mut self, observer: UnitId, other: UnitId) -> Result<()> {
        let other_allegiance = self.require(other)?.allegiance;
        let transition = self
            .require_mut(observer)?
            .sensor
            .on_proximity_enter(other, other_allegiance);
        self.apply_transition(observer, transition);
        Ok(())
    }

    /// `other` left `observer`'s proximity trigger.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if either unit is not live.
    pub fn proximity_exit(&mut self, observer: UnitId, other: UnitId) -> Result<()> {
        let other_allegiance = self.require(other)?.allegiance;
        let transition = self
            .require_mut(observer)?
            .sensor
            .on_proximity_exit(other, other_allegiance);
        self.apply_transition(observer, transition);
        Ok(())
    }

    /// Explicitly assign a target.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if either unit is not live and
    /// [`GameError::InvalidState`] if a unit targets itself.
    pub fn set_target(&mut self, unit: UnitId, target: UnitId) -> Result<()> {
        if unit == target {
            return Err(GameError::InvalidState(format!("{unit} cannot target itself")));
        }
        self.require(target)?;
        let transition = self.require_mut(unit)?.sensor.set_target(target);
        self.apply_transition(unit, transition);
        Ok(())
    }

    /// Drop the unit's target and stop autonomous pursuit.
    ///
    /// A move command in force keeps its path.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is not live.
    pub fn clear_target(&mut self, unit: UnitId) -> Result<()> {
        let live = self.require_mut(unit)?;
        let transition = live.sensor.clear_target();
        let commanded = live.movement.is_commanded();
        self.apply_transition(unit, transition);
        if !commanded {
            self.navigator.cancel(unit);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Movement and combat
    // ------------------------------------------------------------------

    /// Issue an explicit move command.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is not live.
    pub fn issue_move(&mut self, unit: UnitId, destination: Vec3Fixed) -> Result<()> {
        let live = self.require_mut(unit)?;
        live.movement.issue_move(destination);
        let from = live.position;
        self.navigator.navigate_to(unit, from, destination);
        tracing::debug!(%unit, ?destination, "move commanded");
        Ok(())
    }

    /// Teleport a unit. Does not touch its path or intent.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is not live.
    pub fn place_unit(&mut self, unit: UnitId, position: Vec3Fixed) -> Result<()> {
        self.require_mut(unit)?.position = position;
        Ok(())
    }

    /// Whether the unit's current target is within its attack range.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is not live.
    pub fn in_range(&self, unit: UnitId) -> Result<bool> {
        let live = self.require(unit)?;
        let target = live
            .target()
            .and_then(|t| self.units.get(t))
            .map(|t| t.position);
        Ok(CombatResolver::in_range(
            live.position,
            live.stats.attack_range(),
            target,
        ))
    }

    /// Attack `target` now if the cooldown and range allow it.
    ///
    /// Returns `Ok(false)` with no side effect when the target is gone, the
    /// cooldown has not elapsed, or the target is out of range.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the attacker is not live and
    /// [`GameError::InvalidState`] if it attacks itself.
    pub fn try_attack(&mut self, attacker: UnitId, target: UnitId) -> Result<bool> {
        if attacker == target {
            return Err(GameError::InvalidState(format!("{attacker} cannot attack itself")));
        }
        self.require(attacker)?;
        Ok(self.resolve_attack(attacker, target).is_some())
    }

    /// One attack attempt. On a kill the target is destroyed before return.
    fn resolve_attack(&mut self, attacker: UnitId, target: UnitId) -> Option<AttackEvent> {
        // Copy attacker state out to avoid aliasing the target borrow.
        let (origin, profile, mut resolver) = {
            let unit = self.units.get(attacker)?;
            let cooldown = self.clock.seconds_to_ticks(unit.stats.attack_speed());
            (unit.position, unit.attack_profile(cooldown), unit.combat)
        };
        let now = self.clock.now();

        let result = match self.units.get_mut(target) {
            Some(defender) => resolver.try_attack(
                now,
                &profile,
                origin,
                Some(TargetMut {
                    position: defender.position,
                    stats: &mut defender.stats,
                }),
            ),
            None => resolver.try_attack(now, &profile, origin, None),
        };

        if let Some(unit) = self.units.get_mut(attacker) {
            unit.combat = resolver;
        }

        let AttackResult::Hit(change) = result else {
            return None;
        };
        tracing::debug!(
            %attacker,
            %target,
            dealt = change.dealt,
            remaining = change.current,
            "attack landed"
        );
        if change.died {
            tracing::info!(%target, killer = %attacker, "unit killed");
            self.destroy_unit(target);
        }
        Some(AttackEvent {
            attacker,
            target,
            change,
        })
    }

    // ------------------------------------------------------------------
    // Group orders
    // ------------------------------------------------------------------

    /// Move every selected unit to `destination`. Returns how many moved.
    pub fn command_selected_move(&mut self, destination: Vec3Fixed) -> usize {
        let selected = self.selection.selected().to_vec();
        selected
            .into_iter()
            .filter(|&id| self.issue_move(id, destination).is_ok())
            .count()
    }

    /// Point every selected unit at `target`. Returns how many took it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the target is not live; no
    /// unit is changed.
    pub fn command_selected_attack(&mut self, target: UnitId) -> Result<usize> {
        self.require(target)?;
        let selected = self.selection.selected().to_vec();
        Ok(selected
            .into_iter()
            .filter(|&id| id != target && self.set_target(id, target).is_ok())
            .count())
    }

    // ------------------------------------------------------------------
    // Mirror and persistence
    // ------------------------------------------------------------------

    /// Reconcile the mirror with live units. Returns stale records removed.
    pub fn synchronize(&mut self) -> usize {
        self.synchronizer.synchronize(&self.units)
    }

    /// Owned copy of the mirror as last synchronized.
    #[must_use]
    pub fn snapshot(&self) -> GameStateData {
        self.synchronizer.snapshot()
    }

    /// Synchronize, then copy the mirror for saving.
    pub fn save_state(&mut self) -> GameStateData {
        self.synchronize();
        self.snapshot()
    }

    /// Replace the mirror with loaded data and resume in-flight commands.
    ///
    /// Records for live units re-issue their move order and re-assign their
    /// attack target when the target is live. Live units without a record
    /// get a fresh one. Returns the number of commands resumed.
    pub fn load_state(&mut self, data: GameStateData) -> usize {
        let records = data.units.clone();
        self.synchronizer.load(data);

        for id in self.units.sorted_ids() {
            if self.synchronizer.get(id).is_none() {
                if let Some(unit) = self.units.get(id) {
                    self.synchronizer.add_entity(unit);
                }
            }
        }

        let mut resumed = 0;
        for record in records {
            let id = record.unit_id;
            if !self.units.contains(id) {
                continue;
            }
            if let Some(command) = record.movement_command {
                if self.issue_move(id, command.target_position.into()).is_ok() {
                    resumed += 1;
                }
            }
            if let Some(command) = record.attack_command {
                if self.units.contains(command.target_unit_id)
                    && self.set_target(id, command.target_unit_id).is_ok()
                {
                    resumed += 1;
                }
            }
        }
        tracing::info!(resumed, "state loaded");
        resumed
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();

        // Sorted IDs for deterministic processing
        let ids = self.units.sorted_ids();
        let dt = self.clock.tick_seconds();

        // 1. Movement System
        events.arrivals = self.run_movement_system(&ids, dt);

        // 2. Proximity System
        self.run_proximity_system();

        // 3. Controller System
        self.run_controller_system(&ids, &mut events);

        // 4. Clock
        self.clock.advance();
        self.synchronizer.advance_time(dt.to_num());
        events.save_due = self.autosave.poll(self.clock.now());

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.clock.now(), state_hash = hash, "simulation state hash");
        }

        events
    }

    fn run_movement_system(&mut self, ids: &[UnitId], dt: Fixed) -> Vec<UnitId> {
        let mut arrivals = Vec::new();
        for &id in ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            let speed = unit.stats.movement_speed();
            self.navigator.advance(id, &mut unit.position, speed, dt);

            let arrived = unit.movement.refresh(
                self.navigator.has_path(id),
                self.navigator.remaining_distance(id),
                self.navigator.stopping_distance(id),
            );
            if arrived {
                self.navigator.cancel(id);
                tracing::debug!(%id, "move command complete");
                arrivals.push(id);
            }
        }
        arrivals
    }

    fn run_proximity_system(&mut self) {
        for event in self.proximity.update(&self.units) {
            let delivered = match event {
                ProximityEvent::Enter { observer, other } => self.proximity_enter(observer, other),
                ProximityEvent::Exit { observer, other } => self.proximity_exit(observer, other),
            };
            if let Err(err) = delivered {
                tracing::debug!(?event, %err, "proximity event dropped");
            }
        }
    }

    fn run_controller_system(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        let now = self.clock.now();
        for &id in ids {
            // May have died earlier this tick.
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let target = unit.target();
            let target_position = target.and_then(|t| self.units.get(t)).map(|t| t.position);

            if let (Some(stale), None) = (target, target_position) {
                tracing::error!(%id, target = %stale, "sensor held a removed unit");
                #[cfg(feature = "debug-validation")]
                debug_assert!(target_position.is_some(), "{id} tracked removed unit {stale}");
                let transition = self.units.get_mut(id).map(|u| u.sensor.clear_target());
                if let Some(transition) = transition {
                    self.apply_transition(id, transition);
                }
                continue;
            }

            let in_range =
                CombatResolver::in_range(unit.position, unit.stats.attack_range(), target_position);
            let has_path = self.navigator.has_path(id);

            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            let origin = unit.position;
            let intent = unit.movement;
            let Some(decision) =
                unit.controller
                    .decide(now, &intent, origin, target_position, in_range, has_path)
            else {
                continue;
            };

            match decision.path {
                PathAction::Navigate(point) => self.navigator.navigate_to(id, origin, point),
                PathAction::Halt => self.navigator.cancel(id),
                PathAction::None => {}
            }
            if let Some(facing) = decision.facing {
                unit.facing = facing;
            }

            if decision.attack {
                if let Some(target) = target {
                    if let Some(attack) = self.resolve_attack(id, target) {
                        if attack.change.died {
                            events.deaths.push(target);
                        }
                        events.attacks.push(attack);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Sensors or subscriber lists that reference a unit that is not live.
    ///
    /// Always empty unless an invariant is broken.
    #[must_use]
    pub fn stale_references(&self) -> Vec<(UnitId, UnitId)> {
        let mut stale = Vec::new();
        for id in self.units.sorted_ids() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if let Some(target) = unit.target() {
                let subscribed = self
                    .units
                    .get(target)
                    .is_some_and(|t| t.stats.has_death_subscriber(id));
                if !subscribed {
                    stale.push((id, target));
                }
            }
            for subscriber in unit.stats.death_subscribers() {
                if !self.units.contains(subscriber) {
                    stale.push((subscriber, id));
                }
            }
        }
        stale
    }

    /// Hash of simulation state for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.clock.now().hash(&mut hasher);

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.units.get(id) {
                id.hash(&mut hasher);
                unit.position.hash(&mut hasher);
                unit.facing.hash(&mut hasher);
                unit.stats.current_health().hash(&mut hasher);
                unit.target().hash(&mut hasher);
                unit.movement.destination().hash(&mut hasher);
                unit.combat.next_attack_tick().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitDefinition;
    use crate::registry::Allegiance;

    fn params(allegiance: Allegiance, x: i32) -> UnitSpawnParams {
        UnitSpawnParams::new("u", allegiance, Vec3Fixed::from_ints(x, 0, 0))
            .with_definition(UnitDefinition::default().with_sensor_radius(Fixed::ZERO))
    }

    #[test]
    fn test_spawn_registers_everywhere() {
        let mut sim = Simulation::default();
        let player = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        let enemy = sim.spawn_unit(params(Allegiance::Enemy, 5)).unwrap();

        assert!(sim.registry().contains(player));
        assert_eq!(sim.synchronizer().len(), 2);
        assert_eq!(sim.selection().player_units(), &[player]);
        assert_eq!(sim.registry().by_allegiance(Allegiance::Enemy), vec![enemy]);
    }

    #[test]
    fn test_duplicate_spawn_is_rejected() {
        let mut sim = Simulation::default();
        let id = UnitId::from_raw(7);
        sim.spawn_unit_with_id(id, params(Allegiance::Player, 0)).unwrap();
        let err = sim.spawn_unit_with_id(id, params(Allegiance::Enemy, 3)).unwrap_err();
        assert!(matches!(err, GameError::DuplicateUnit(dup) if dup == id));
        assert_eq!(sim.units().len(), 1);
        assert_eq!(sim.unit(id).unwrap().allegiance, Allegiance::Player);
    }

    #[cfg(not(feature = "debug-validation"))]
    #[test]
    fn test_stale_sensor_target_is_cleared() {
        let mut sim = Simulation::default();
        let watcher = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        let ghost = UnitId::from_raw(999);
        if let Some(unit) = sim.units.get_mut(watcher) {
            unit.sensor.set_target(ghost);
        }

        sim.tick();
        assert_eq!(sim.unit(watcher).unwrap().target(), None);
    }

    #[test]
    fn test_respawn_under_despawned_id_is_rejected() {
        let mut sim = Simulation::default();
        let id = UnitId::from_raw(7);
        sim.spawn_unit_with_id(id, params(Allegiance::Player, 0)).unwrap();
        sim.despawn_unit(id).unwrap();

        let err = sim.spawn_unit_with_id(id, params(Allegiance::Enemy, 3)).unwrap_err();
        assert!(matches!(err, GameError::DuplicateUnit(dup) if dup == id));
        assert!(sim.unit(id).is_none());
        assert!(sim.synchronizer().is_empty());
        assert!(sim.spawn_unit(params(Allegiance::Enemy, 3)).unwrap() > id);
    }

    #[test]
    fn test_despawn_twice() {
        let mut sim = Simulation::default();
        let id = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        sim.despawn_unit(id).unwrap();
        assert!(matches!(sim.despawn_unit(id), Err(GameError::UnitNotFound(_))));
        assert!(sim.synchronizer().is_empty());
        assert!(sim.selection().player_units().is_empty());
    }

    #[test]
    fn test_set_target_subscribes_and_clear_unsubscribes() {
        let mut sim = Simulation::default();
        let a = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        let b = sim.spawn_unit(params(Allegiance::Enemy, 5)).unwrap();
        let c = sim.spawn_unit(params(Allegiance::Enemy, 9)).unwrap();

        sim.set_target(a, b).unwrap();
        assert!(sim.unit(b).unwrap().stats.has_death_subscriber(a));

        sim.set_target(a, c).unwrap();
        assert!(!sim.unit(b).unwrap().stats.has_death_subscriber(a));
        assert!(sim.unit(c).unwrap().stats.has_death_subscriber(a));

        sim.clear_target(a).unwrap();
        assert!(!sim.unit(c).unwrap().stats.has_death_subscriber(a));
        assert!(sim.stale_references().is_empty());
    }

    #[test]
    fn test_self_target_is_invalid() {
        let mut sim = Simulation::default();
        let a = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        assert!(matches!(sim.set_target(a, a), Err(GameError::InvalidState(_))));
        assert!(matches!(
            sim.set_target(a, UnitId::from_raw(99)),
            Err(GameError::UnitNotFound(_))
        ));
    }

    #[test]
    fn test_destroying_attacker_releases_its_subscription() {
        let mut sim = Simulation::default();
        let a = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
        let b = sim.spawn_unit(params(Allegiance::Enemy, 5)).unwrap();
        sim.set_target(a, b).unwrap();
        sim.despawn_unit(a).unwrap();
        assert_eq!(sim.unit(b).unwrap().stats.death_subscribers().count(), 0);
    }

    #[test]
    fn test_deterministic_hash() {
        let build = || {
            let mut sim = Simulation::default();
            let a = sim.spawn_unit(params(Allegiance::Player, 0)).unwrap();
            sim.spawn_unit(params(Allegiance::Enemy, 20)).unwrap();
            sim.issue_move(a, Vec3Fixed::from_ints(10, 0, 3)).unwrap();
            for _ in 0..30 {
                sim.tick();
            }
            sim.state_hash()
        };
        assert_eq!(build(), build());
    }
}
