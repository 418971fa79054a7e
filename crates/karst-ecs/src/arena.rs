//! Insertion-ordered component storage.
//!
//! An [`Arena`] keeps components in a dense `Vec` in the order they were
//! attached, with a hash index for O(1) lookup by entity. Iteration order is
//! attach order, which is what makes system sweeps deterministic: two worlds
//! built by the same sequence of calls iterate identically.

use std::collections::HashMap;

use crate::entity::EntityId;

/// Dense, insertion-ordered store of one component type.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    entries: Vec<(EntityId, T)>,
    index: HashMap<EntityId, usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component for `entity`. Returns the previous component if one
    /// was already attached.
    pub fn insert(&mut self, entity: EntityId, component: T) -> Option<T> {
        if let Some(&slot) = self.index.get(&entity) {
            let old = std::mem::replace(&mut self.entries[slot].1, component);
            return Some(old);
        }
        self.index.insert(entity, self.entries.len());
        self.entries.push((entity, component));
        None
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.index.get(&entity).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        let slot = *self.index.get(&entity)?;
        Some(&mut self.entries[slot].1)
    }

    /// Remove `entity`'s component, preserving the order of the rest.
    ///
    /// Removal is O(n); it only happens during the end-of-tick purge, never
    /// inside a system sweep.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let slot = self.index.remove(&entity)?;
        let (_, component) = self.entries.remove(slot);
        for (_, later) in self.index.iter_mut() {
            if *later > slot {
                *later -= 1;
            }
        }
        Some(component)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entity at a dense slot, in attach order.
    pub fn entity_at(&self, slot: usize) -> Option<EntityId> {
        self.entries.get(slot).map(|(entity, _)| *entity)
    }

    /// Component at a dense slot, in attach order.
    pub fn at(&self, slot: usize) -> Option<&T> {
        self.entries.get(slot).map(|(_, component)| component)
    }

    pub fn at_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.entries.get_mut(slot).map(|(_, component)| component)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entries.iter().map(|(entity, component)| (*entity, component))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(entity, component)| (*entity, component))
    }

    /// Entities in attach order, collected. Handy for index-free sweeps that
    /// need to mutate mid-iteration.
    pub fn entities(&self) -> Vec<EntityId> {
        self.entries.iter().map(|(entity, _)| *entity).collect()
    }
}
