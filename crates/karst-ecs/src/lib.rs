//! Karst ECS -- typed entity-component registry for the Karst platformer core.
//!
//! Entities are generational handles; components live in per-type arenas that
//! preserve attach order, so system sweeps are deterministic by construction.
//! The component set is closed (see [`component::ComponentKind`]): this is a
//! simulation core with a fixed vocabulary, not a general-purpose ECS.
//!
//! # Quick Start
//!
//! ```
//! use karst_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let hero = world.spawn(Scene::Global, "hero");
//! world.attach(hero, Position::new(0.0, 120.0)).unwrap();
//! world.attach(hero, Physics::new(5000.0, 2000.0)).unwrap();
//! world.attach(hero, Health::new(100.0)).unwrap();
//!
//! assert!(world.has::<Physics>(hero));
//! assert_eq!(world.get::<Position>(hero).unwrap().y, 120.0);
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod component;
pub mod entity;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or already purged).
    #[error("entity {entity} does not exist (stale or already purged)")]
    DeadEntity { entity: entity::EntityId },

    /// The entity already carries a component of this kind.
    #[error("entity {entity} already has a {kind} component")]
    DuplicateComponent {
        entity: entity::EntityId,
        kind: component::ComponentKind,
    },

    /// Every non-position component requires a position to be attached first.
    #[error("cannot attach {kind} to entity {entity}: no position component")]
    MissingPosition {
        entity: entity::EntityId,
        kind: component::ComponentKind,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::component::{
        Collider, Component, ComponentKind, Damage, EntityClass, Health, Movement, Physics,
        Position,
    };
    pub use crate::entity::{EntityAllocator, EntityId, Scene};
    pub use crate::world::{EntityMeta, World};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
