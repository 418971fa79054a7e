//! Entity handles, the slot allocator behind them, and scene tags.
//!
//! Handles are generational: destroying an entity bumps the generation of its
//! slot, so any copy of the handle that outlived the entity stops matching.
//! Dangling handles fail lookups instead of reaching a recycled entity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

const GENERATION_SHIFT: u32 = 32;
const INDEX_MASK: u64 = u32::MAX as u64;

/// A generational entity handle.
///
/// Packs a slot index into the low half of a `u64` and the slot's generation
/// into the high half, so a handle is a single copyable word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Pack an index and generation into a handle.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << GENERATION_SHIFT | index as u64)
    }

    /// The slot index this handle points at.
    #[inline]
    pub fn index(self) -> u32 {
        (self.0 & INDEX_MASK) as u32
    }

    /// The generation the slot had when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> GENERATION_SHIFT) as u32
    }

    /// The packed word, for serialization or keying.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from [`EntityId::to_raw`] output.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// The scene tag on an entity.
///
/// `Global` entities are simulated on every tick regardless of which stage is
/// current; `Stage(n)` entities are simulated only while stage `n` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scene {
    /// Always active.
    Global,
    /// Active only while the matching stage is current.
    Stage(u32),
}

impl Scene {
    /// Whether an entity with this tag participates in the current stage.
    #[inline]
    pub fn is_active(self, current_stage: u32) -> bool {
        match self {
            Scene::Global => true,
            Scene::Stage(n) => n == current_stage,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// One slot in the allocator's table.
#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Hands out [`EntityId`]s and recycles their slots.
///
/// Freed slots wait in a queue and are reused oldest-first, which spreads
/// recycling across the table instead of hammering one slot's generation.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    recycle_queue: VecDeque<u32>,
    live: usize,
}

impl EntityAllocator {
    /// An allocator with no slots yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle, reusing the oldest freed slot when one exists.
    pub fn allocate(&mut self) -> EntityId {
        self.live += 1;
        match self.recycle_queue.pop_front() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.occupied = true;
                EntityId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    occupied: true,
                });
                EntityId::new(index, 0)
            }
        }
    }

    /// Retire the slot behind `id` and bump its generation so outstanding
    /// copies of the handle go stale.
    ///
    /// Returns `false` when `id` is already stale or was never issued.
    pub fn free(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.slots[id.index() as usize];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.recycle_queue.push_back(id.index());
        self.live -= 1;
        true
    }

    /// Whether `id` still points at the entity it was issued for.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation())
    }

    /// How many handles are currently live.
    pub fn alive_count(&self) -> usize {
        self.live
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
