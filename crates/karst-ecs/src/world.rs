//! The [`World`]: entity bookkeeping plus one arena per component type.

use std::collections::HashMap;

use tracing::debug;

use crate::arena::Arena;
use crate::component::{
    Collider, Component, ComponentKind, Damage, Health, Movement, Physics, Position,
};
use crate::entity::{EntityAllocator, EntityId, Scene};
use crate::EcsError;

/// Non-component data tracked per entity.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    pub scene: Scene,
    pub name: String,
}

/// All simulation state: alive entities, their metadata, and the component
/// arenas.
///
/// The arenas are public so that systems can borrow two of them mutably at
/// once; the typed accessors below are the convenient path when only one
/// component is in play.
#[derive(Debug, Default)]
pub struct World {
    allocator: EntityAllocator,
    metas: HashMap<EntityId, EntityMeta>,

    pub positions: Arena<Position>,
    pub physics: Arena<Physics>,
    pub colliders: Arena<Collider>,
    pub movements: Arena<Movement>,
    pub damages: Arena<Damage>,
    pub healths: Arena<Health>,

    /// Entities queued for destruction at the end of the tick. Deduplicated
    /// on insert so a double kill purges once.
    dying: Vec<EntityId>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Create a new entity in `scene` with a debug `name`.
    pub fn spawn(&mut self, scene: Scene, name: impl Into<String>) -> EntityId {
        let id = self.allocator.allocate();
        let name = name.into();
        debug!(entity = %id, %name, "spawn");
        self.metas.insert(id, EntityMeta { scene, name });
        id
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn scene_of(&self, entity: EntityId) -> Option<Scene> {
        self.metas.get(&entity).map(|meta| meta.scene)
    }

    pub fn name_of(&self, entity: EntityId) -> Option<&str> {
        self.metas.get(&entity).map(|meta| meta.name.as_str())
    }

    /// Queue `entity` for destruction at the end of the current tick.
    /// Queueing the same entity twice is a no-op.
    pub fn queue_dead(&mut self, entity: EntityId) {
        if !self.dying.contains(&entity) {
            self.dying.push(entity);
        }
    }

    /// Entities currently queued for destruction.
    pub fn dying(&self) -> &[EntityId] {
        &self.dying
    }

    /// Destroy every queued entity: detach all components, drop metadata,
    /// and recycle the id. Returns how many entities were purged.
    pub fn purge_dead(&mut self) -> usize {
        let dying = std::mem::take(&mut self.dying);
        let purged = dying.len();
        for entity in dying {
            debug!(entity = %entity, "purge");
            self.positions.remove(entity);
            self.physics.remove(entity);
            self.colliders.remove(entity);
            self.movements.remove(entity);
            self.damages.remove(entity);
            self.healths.remove(entity);
            self.metas.remove(&entity);
            self.allocator.free(entity);
        }
        purged
    }

    // -----------------------------------------------------------------------
    // Component attachment
    // -----------------------------------------------------------------------

    /// Attach a component to `entity`.
    ///
    /// Every component except [`Position`] requires a position to already be
    /// attached; attaching a duplicate kind or attaching to a dead entity are
    /// errors.
    pub fn attach<C: Component>(&mut self, entity: EntityId, component: C) -> Result<(), EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::DeadEntity { entity });
        }
        if C::KIND != ComponentKind::Position && !self.positions.contains(entity) {
            return Err(EcsError::MissingPosition {
                entity,
                kind: C::KIND,
            });
        }
        if C::arena(self).contains(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                kind: C::KIND,
            });
        }
        C::arena_mut(self).insert(entity, component);
        Ok(())
    }

    /// Shared access to `entity`'s component of type `C`, if attached.
    pub fn get<C: Component>(&self, entity: EntityId) -> Option<&C> {
        C::arena(self).get(entity)
    }

    /// Mutable access to `entity`'s component of type `C`, if attached.
    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        C::arena_mut(self).get_mut(entity)
    }

    /// Whether `entity` has a component of type `C`.
    pub fn has<C: Component>(&self, entity: EntityId) -> bool {
        C::arena(self).contains(entity)
    }

    /// Whether `entity` is alive and its scene is active for `current_stage`.
    /// Global entities participate in every stage.
    pub fn participates(&self, entity: EntityId, current_stage: u32) -> bool {
        if !self.allocator.is_alive(entity) {
            return false;
        }
        let Some(meta) = self.metas.get(&entity) else {
            return false;
        };
        meta.scene.is_active(current_stage)
    }
}
