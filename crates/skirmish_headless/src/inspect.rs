//! Plain-text view of a saved mirror.

use skirmish_core::registry::Allegiance;
use skirmish_core::snapshot::{GameStateData, StateSynchronizer, UnitRecord};

/// Render a saved state as one section per allegiance.
#[must_use]
pub fn render_state(data: GameStateData) -> String {
    let mut mirror = StateSynchronizer::new();
    mirror.load(data);

    let mut lines = vec![format!("Game time: {:.1}s", mirror.state().game_time)];
    for side in [Allegiance::Player, Allegiance::Enemy] {
        let records: Vec<&UnitRecord> = mirror.by_allegiance(side).collect();
        lines.push(format!("{side:?}: {} units", records.len()));
        lines.extend(records.into_iter().map(render_record));
    }
    lines.join("\n")
}

fn render_record(unit: &UnitRecord) -> String {
    let pos = unit.current_position;
    let order = match (&unit.movement_command, &unit.attack_command) {
        (Some(m), _) => format!(
            "moving to ({:.1}, {:.1}, {:.1})",
            m.target_position.x, m.target_position.y, m.target_position.z
        ),
        (None, Some(a)) => format!("engaging {}", a.target_unit_id),
        (None, None) => "idle".to_string(),
    };
    format!(
        "  {:<8} {:<16} {:>4}/{:<4} at ({:.1}, {:.1}, {:.1})  {order}",
        unit.unit_id.to_string(),
        unit.unit_name,
        unit.health,
        unit.max_health,
        pos.x,
        pos.y,
        pos.z
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::simulation::Simulation;
    use skirmish_test_utils::fixtures::{dummy, ground, rifleman, spawn};

    #[test]
    fn test_units_are_grouped_by_allegiance() {
        let mut sim = Simulation::default();
        let scout = spawn(&mut sim, Allegiance::Player, ground(1, 2), rifleman());
        let post = spawn(&mut sim, Allegiance::Enemy, ground(9, 0), dummy(40, 0));
        spawn(&mut sim, Allegiance::Enemy, ground(9, 4), dummy(40, 0));
        sim.set_target(scout, post).unwrap();

        let text = render_state(sim.save_state());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Game time: 0.0s");
        assert_eq!(lines[1], "Player: 1 units");
        assert!(lines[2].contains("Rifleman"));
        assert!(lines[2].ends_with(&format!("engaging {post}")));
        assert_eq!(lines[3], "Enemy: 2 units");
        assert!(lines[4..].iter().all(|l| l.contains("Dummy") && l.ends_with("idle")));
    }

    #[test]
    fn test_empty_state_lists_both_sides() {
        let text = render_state(GameStateData::default());
        assert_eq!(text, "Game time: 0.0s\nPlayer: 0 units\nEnemy: 0 units");
    }
}
