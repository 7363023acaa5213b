//! Player-unit index and current selection.

use crate::registry::{Allegiance, RegistryObserver, UnitId};
use crate::unit::Unit;

/// Player units known to the registry and the subset currently selected.
///
/// Both lists keep insertion order. Unregistered units leave both.
#[derive(Debug, Clone, Default)]
pub struct SelectionIndex {
    player_units: Vec<UnitId>,
    selected: Vec<UnitId>,
}

impl SelectionIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selectable player units.
    #[must_use]
    pub fn player_units(&self) -> &[UnitId] {
        &self.player_units
    }

    /// Current selection.
    #[must_use]
    pub fn selected(&self) -> &[UnitId] {
        &self.selected
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: UnitId) -> bool {
        self.selected.contains(&id)
    }

    /// Replace the selection with a single unit. Non-player ids are ignored.
    pub fn select(&mut self, id: UnitId) -> bool {
        if !self.player_units.contains(&id) {
            return false;
        }
        self.selected.clear();
        self.selected.push(id);
        true
    }

    /// Add or remove one unit (multi-select).
    pub fn toggle(&mut self, id: UnitId) {
        if let Some(pos) = self.selected.iter().position(|&s| s == id) {
            self.selected.remove(pos);
        } else if self.player_units.contains(&id) {
            self.selected.push(id);
        }
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Select a group, replacing or extending the selection.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = UnitId>, additive: bool) {
        if !additive {
            self.selected.clear();
        }
        for id in ids {
            if self.player_units.contains(&id) && !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }
}

impl RegistryObserver for SelectionIndex {
    fn unit_registered(&mut self, unit: &Unit) {
        if unit.allegiance == Allegiance::Player && !self.player_units.contains(&unit.id) {
            self.player_units.push(unit.id);
        }
    }

    fn unit_unregistered(&mut self, id: UnitId, _allegiance: Allegiance) {
        self.player_units.retain(|&u| u != id);
        self.selected.retain(|&u| u != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3Fixed;
    use crate::unit::UnitSpawnParams;

    fn index_with(units: &[(u64, Allegiance)]) -> SelectionIndex {
        let mut index = SelectionIndex::new();
        for &(raw, allegiance) in units {
            let unit = Unit::new(
                UnitId::from_raw(raw),
                UnitSpawnParams::new("u", allegiance, Vec3Fixed::ZERO),
                4,
            );
            index.unit_registered(&unit);
        }
        index
    }

    fn id(raw: u64) -> UnitId {
        UnitId::from_raw(raw)
    }

    #[test]
    fn test_only_player_units_are_selectable() {
        let mut index = index_with(&[(1, Allegiance::Player), (2, Allegiance::Enemy)]);
        assert_eq!(index.player_units(), &[id(1)]);
        assert!(!index.select(id(2)));
        assert!(index.select(id(1)));
        assert_eq!(index.selected(), &[id(1)]);
    }

    #[test]
    fn test_toggle_and_group_select() {
        let mut index = index_with(&[
            (1, Allegiance::Player),
            (2, Allegiance::Player),
            (3, Allegiance::Player),
        ]);
        index.toggle(id(1));
        index.toggle(id(3));
        assert_eq!(index.selected(), &[id(1), id(3)]);
        index.toggle(id(1));
        assert_eq!(index.selected(), &[id(3)]);

        index.select_many([id(1), id(2)], true);
        assert_eq!(index.selected(), &[id(3), id(1), id(2)]);
        index.select_many([id(2)], false);
        assert_eq!(index.selected(), &[id(2)]);

        index.deselect_all();
        assert!(index.selected().is_empty());
    }

    #[test]
    fn test_unregistered_units_leave_both_lists() {
        let mut index = index_with(&[(1, Allegiance::Player), (2, Allegiance::Player)]);
        index.select_many([id(1), id(2)], false);
        index.unit_unregistered(id(1), Allegiance::Player);
        assert_eq!(index.player_units(), &[id(2)]);
        assert_eq!(index.selected(), &[id(2)]);
        assert!(!index.is_selected(id(1)));
    }
}
