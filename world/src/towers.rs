//! Authoritative tower storage and identifier allocation.

use pop_defence_core::{Tower, TowerId};

/// Registry that stores towers in identifier order.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: Vec<Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Hands out the next unused identifier.
    pub(crate) fn allocate(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        id
    }

    /// Stores a tower built with an identifier from [`TowerRegistry::allocate`].
    pub(crate) fn insert(&mut self, tower: Tower) {
        match self.index_of(tower.id()) {
            Ok(index) => self.entries[index] = tower,
            Err(index) => self.entries.insert(index, tower),
        }
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.index_of(id).ok().map(|index| &self.entries[index])
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.index_of(id).ok().map(|index| &mut self.entries[index])
    }

    /// Removes the tower, returning it together with its in-flight projectiles.
    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.index_of(id).ok().map(|index| self.entries.remove(index))
    }

    pub(crate) fn as_slice(&self) -> &[Tower] {
        &self.entries
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.iter_mut()
    }

    fn index_of(&self, id: TowerId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, Tower::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pop_defence_catalog::Catalog;
    use pop_defence_core::{TowerKind, Vec2};
    use std::time::Duration;

    fn tower(id: TowerId) -> Tower {
        let catalog = Catalog::builtin().expect("builtin catalog parses");
        let blueprint = catalog.tower(TowerKind::Arrow).expect("arrow blueprint");
        Tower::new(
            id,
            TowerKind::Arrow,
            Vec2::ZERO,
            blueprint.loadout().clone(),
            blueprint.price(),
            Duration::ZERO,
        )
    }

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let mut registry = TowerRegistry::new();
        assert!(registry.as_slice().is_empty());
        assert_eq!(registry.allocate(), TowerId::new(0));
        assert_eq!(registry.allocate(), TowerId::new(1));
    }

    #[test]
    fn towers_stay_sorted_by_identifier() {
        let mut registry = TowerRegistry::new();
        registry.insert(tower(TowerId::new(4)));
        registry.insert(tower(TowerId::new(1)));
        registry.insert(tower(TowerId::new(2)));

        let ids: Vec<_> = registry.as_slice().iter().map(Tower::id).collect();
        assert_eq!(ids, vec![TowerId::new(1), TowerId::new(2), TowerId::new(4)]);
    }

    #[test]
    fn removal_returns_the_tower_once() {
        let mut registry = TowerRegistry::new();
        let id = registry.allocate();
        registry.insert(tower(id));

        assert!(registry.get(id).is_some());
        assert_eq!(registry.remove(id).map(|tower| tower.id()), Some(id));
        assert!(registry.remove(id).is_none());
        assert!(registry.get_mut(id).is_none());
    }
}
