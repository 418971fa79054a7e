//! The closed set of simulation components.
//!
//! Each component type is a plain serde-derived struct plus an impl of
//! [`Component`], which binds the type to the arena that stores it inside the
//! [`World`](crate::world::World). An entity carries at most one component of
//! each [`ComponentKind`]; the world enforces that at attach time.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::Arena;
use crate::world::World;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Discriminant for the component types the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Position,
    Physics,
    Collider,
    Movement,
    Damage,
    Health,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Position => "position",
            ComponentKind::Physics => "physics",
            ComponentKind::Collider => "collider",
            ComponentKind::Movement => "movement",
            ComponentKind::Damage => "damage",
            ComponentKind::Health => "health",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Binds a component type to its arena in the world.
///
/// This is the typed replacement for tag-keyed downcast dispatch: there is
/// exactly one store per kind, selected at compile time.
pub trait Component: Sized {
    /// The kind tag for this component type.
    const KIND: ComponentKind;

    /// Shared access to this type's arena.
    fn arena(world: &World) -> &Arena<Self>;

    /// Mutable access to this type's arena.
    fn arena_mut(world: &mut World) -> &mut Arena<Self>;
}

macro_rules! impl_component {
    ($ty:ident, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: ComponentKind = ComponentKind::$kind;

            fn arena(world: &World) -> &Arena<Self> {
                &world.$field
            }

            fn arena_mut(world: &mut World) -> &mut Arena<Self> {
                &mut world.$field
            }
        }
    };
}

// ---------------------------------------------------------------------------
// EntityClass
// ---------------------------------------------------------------------------

/// Coarse gameplay classification used by damage targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Player,
    Enemy,
    Object,
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// World-space placement of an entity.
///
/// `is_static` bodies never move; the physics integrator force-zeroes their
/// velocity every tick and the position integrator skips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    /// Elevation, used only for render-side culling.
    pub z: f32,
    /// Rotation in degrees, counter-clockwise.
    pub rotation: f32,
    pub is_static: bool,
}

impl Position {
    /// A movable body at `(x, y)`.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            rotation: 0.0,
            is_static: false,
        }
    }

    /// An immovable body at `(x, y)`.
    pub fn fixed(x: f32, y: f32) -> Self {
        Self {
            is_static: true,
            ..Self::new(x, y)
        }
    }

    /// The position as a 2D vector (elevation dropped).
    #[inline]
    pub fn vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Rotate a body-local point by this position's rotation.
    ///
    /// Used by the legacy corner-based collision path; the slab sweep treats
    /// colliders as axis-aligned.
    pub fn rotate(&self, point: Vec2) -> Vec2 {
        if self.rotation == 0.0 {
            return point;
        }
        let radians = self.rotation.to_radians();
        let (sin, cos) = radians.sin_cos();
        Vec2::new(point.x * cos - point.y * sin, point.x * sin + point.y * cos)
    }
}

impl_component!(Position, Position, positions);

// ---------------------------------------------------------------------------
// Physics
// ---------------------------------------------------------------------------

/// Velocity state and the coefficients the integrator applies to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub rot_velocity: f32,
    /// Deceleration applied while resting on a platform (quartered while
    /// climbing).
    pub drag: f32,
    /// Current downward acceleration; movement may scale it for variable
    /// jump height.
    pub gravity_mod: f32,
    /// The unscaled gravity to restore once jump shaping stops.
    pub base_gravity_mod: f32,
}

impl Physics {
    pub fn new(drag: f32, gravity_mod: f32) -> Self {
        Self {
            velocity_x: 0.0,
            velocity_y: 0.0,
            rot_velocity: 0.0,
            drag,
            gravity_mod,
            base_gravity_mod: gravity_mod,
        }
    }

    /// Construct with an initial velocity, e.g. for projectiles.
    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity_x = vx;
        self.velocity_y = vy;
        self
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.velocity_x, self.velocity_y)
    }
}

impl_component!(Physics, Physics, physics);

// ---------------------------------------------------------------------------
// Collider
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle centered at the entity's position plus `offset`.
///
/// `on_platform` and `collided_this_tick` are transient: the collision engine
/// recomputes them from scratch at the start of every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Inactive colliders never initiate contact. Flipped off when a damage
    /// source runs out of uses.
    pub active: bool,
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub mass: f32,
    pub bounce: f32,
    pub friction: f32,

    /// Surface others can rest on; platform colliders never initiate solid
    /// sweeps themselves.
    pub platform: bool,
    pub one_way_platform: bool,
    pub climbable: bool,
    /// Trigger colliders detect overlap but are never solid.
    pub trigger: bool,
    pub takes_damage: bool,
    pub does_damage: bool,

    pub class: EntityClass,

    // Transient, recomputed each tick.
    pub on_platform: bool,
    pub collided_this_tick: bool,
}

impl Collider {
    fn base(width: f32, height: f32) -> Self {
        Self {
            active: true,
            width,
            height,
            offset_x: 0.0,
            offset_y: 0.0,
            mass: 1.0,
            bounce: 0.0,
            friction: 1.0,
            platform: false,
            one_way_platform: false,
            climbable: false,
            trigger: false,
            takes_damage: false,
            does_damage: false,
            class: EntityClass::Object,
            on_platform: false,
            collided_this_tick: false,
        }
    }

    /// A solid, damage-accepting body (players, enemies).
    pub fn body(width: f32, height: f32, class: EntityClass) -> Self {
        Self {
            takes_damage: true,
            class,
            ..Self::base(width, height)
        }
    }

    /// A platform surface others can land on.
    pub fn platform(width: f32, height: f32) -> Self {
        Self {
            platform: true,
            mass: 1000.0,
            ..Self::base(width, height)
        }
    }

    /// A climbable platform surface.
    pub fn climbable_platform(width: f32, height: f32) -> Self {
        Self {
            climbable: true,
            ..Self::platform(width, height)
        }
    }

    /// A non-solid trigger volume (projectiles, damage fields).
    pub fn trigger(width: f32, height: f32) -> Self {
        Self {
            trigger: true,
            ..Self::base(width, height)
        }
    }

    /// Mark this collider as dealing damage on trigger overlap.
    pub fn damaging(mut self) -> Self {
        self.does_damage = true;
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    /// Collider center in world space.
    #[inline]
    pub fn center(&self, pos: &Position) -> Vec2 {
        Vec2::new(pos.x + self.offset_x, pos.y + self.offset_y)
    }
}

impl_component!(Collider, Collider, colliders);

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Locomotion parameters and state: walking, jumping, climbing.
///
/// Jump bookkeeping (jump count, coyote-time accrual, the released-jump
/// latch) lives here rather than on an input component; the core only ever
/// sees an input snapshot, never the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub acceleration: f32,
    pub max_speed: f32,
    pub max_jump_height: f32,
    /// Fraction of ground acceleration available mid-air.
    pub air_control: f32,
    pub can_move: bool,

    pub jumping: bool,
    pub preparing_to_jump: bool,
    pub jumps: u32,
    pub max_jumps: u32,
    /// Seconds since leaving a platform; a jump is still honored while this
    /// is under `max_coyote_time`.
    pub coyote_time: f32,
    pub max_coyote_time: f32,
    /// Set once the jump input is released; blocks autorepeat.
    pub released_jump: bool,

    pub can_climb: bool,
    pub should_climb: bool,
    pub climbing: bool,
    /// Vertical extent of the surface being climbed, captured on first grab.
    pub min_climb_height: f32,
    pub max_climb_height: f32,
}

impl Movement {
    pub fn new(acceleration: f32, max_speed: f32, max_jump_height: f32) -> Self {
        Self {
            acceleration,
            max_speed,
            max_jump_height,
            air_control: 0.5,
            can_move: true,
            jumping: false,
            preparing_to_jump: false,
            jumps: 0,
            max_jumps: 2,
            coyote_time: 0.0,
            max_coyote_time: 0.1,
            released_jump: true,
            can_climb: true,
            should_climb: false,
            climbing: false,
            min_climb_height: 0.0,
            max_climb_height: 0.0,
        }
    }
}

impl_component!(Movement, Movement, movements);

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

/// Damage dealt by a trigger collider, with optional lifetime and use limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    /// Seconds left before the owning entity is destroyed, if limited.
    pub lifetime: Option<f32>,
    /// Hits left before exhaustion, if limited.
    pub uses: Option<i32>,
    pub damage: f32,
    /// Keep the entity visible after its uses run out (the collider is still
    /// deactivated).
    pub show_after_uses: bool,
    pub hits_players: bool,
    pub hits_enemies: bool,
    pub hits_objects: bool,
}

impl Damage {
    pub fn new(damage: f32) -> Self {
        Self {
            lifetime: None,
            uses: None,
            damage,
            show_after_uses: false,
            hits_players: false,
            hits_enemies: true,
            hits_objects: true,
        }
    }

    pub fn with_lifetime(mut self, seconds: f32) -> Self {
        self.lifetime = Some(seconds);
        self
    }

    pub fn with_uses(mut self, uses: i32) -> Self {
        self.uses = Some(uses);
        self
    }

    /// Whether this damage source affects the given class.
    pub fn hits(&self, class: EntityClass) -> bool {
        match class {
            EntityClass::Player => self.hits_players,
            EntityClass::Enemy => self.hits_enemies,
            EntityClass::Object => self.hits_objects,
        }
    }
}

impl_component!(Damage, Damage, damages);

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Hit points. Once `health` drops to zero the health system flips `dead`
/// and queues the entity for the end-of-tick purge; other systems observe
/// `dead` and suppress physical response until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub health: f32,
    pub dead: bool,
}

impl Health {
    pub fn new(health: f32) -> Self {
        Self {
            health,
            dead: false,
        }
    }
}

impl_component!(Health, Health, healths);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_identity_at_zero_rotation() {
        let pos = Position::new(0.0, 0.0);
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(pos.rotate(p), p);
    }

    #[test]
    fn rotate_quarter_turn() {
        let mut pos = Position::new(0.0, 0.0);
        pos.rotation = 90.0;
        let p = pos.rotate(Vec2::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn damage_class_targeting() {
        let dmg = Damage::new(10.0);
        assert!(!dmg.hits(EntityClass::Player));
        assert!(dmg.hits(EntityClass::Enemy));
        assert!(dmg.hits(EntityClass::Object));
    }

    #[test]
    fn collider_constructors_set_flags() {
        let plat = Collider::platform(540.0, 80.0);
        assert!(plat.platform && !plat.trigger);

        let trig = Collider::trigger(5.0, 5.0).damaging();
        assert!(trig.trigger && trig.does_damage && !trig.platform);

        let body = Collider::body(40.0, 120.0, EntityClass::Player);
        assert!(body.takes_damage);
        assert_eq!(body.class, EntityClass::Player);
    }

    #[test]
    fn components_roundtrip_through_json() {
        let phys = Physics::new(5000.0, 2000.0).with_velocity(10.0, -3.0);
        let json = serde_json::to_string(&phys).unwrap();
        let back: Physics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phys);
    }
}
