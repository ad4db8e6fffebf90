//! Move requests: externally triggered moves waiting for the next fetch.
//!
//! Requests live for at most one fetch cycle: the entity takes the
//! lowest-priority one and the rest are dropped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use glam::IVec2;

use crate::components::entity::EntityState;
use crate::components::moves::EntityMove;
use crate::core::world::World;
use crate::error::SimError;
use crate::systems::brain::step_move;

pub trait MoveRequest: fmt::Debug {
    /// Lower values are processed first.
    fn priority(&self) -> i32;

    /// Resolve into a concrete move for `entity`.
    /// Processing against an entity that is no longer alive is an error.
    fn process(&self, entity: &EntityState, world: &World) -> Result<EntityMove, SimError>;
}

#[derive(Debug)]
struct Queued {
    priority: i32,
    seq: u64,
    request: Box<dyn MoveRequest>,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.priority, self.seq).cmp(&(other.priority, other.seq))
    }
}

/// Min-priority queue of pending requests; equal priorities pop in push order.
#[derive(Debug, Default)]
pub struct MoveQueue {
    heap: BinaryHeap<Reverse<Queued>>,
    next_seq: u64,
}

impl MoveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: impl MoveRequest + 'static) {
        self.push_boxed(Box::new(request));
    }

    pub fn push_boxed(&mut self, request: Box<dyn MoveRequest>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Queued {
            priority: request.priority(),
            seq,
            request,
        }));
    }

    /// Remove and return the lowest-priority request.
    pub fn pop(&mut self) -> Option<Box<dyn MoveRequest>> {
        self.heap.pop().map(|Reverse(q)| q.request)
    }

    pub fn peek_priority(&self) -> Option<i32> {
        self.heap.peek().map(|Reverse(q)| q.priority)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Shove an entity by a cell delta, as far as the geometry allows.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub delta: IVec2,
    pub priority: i32,
}

impl PushRequest {
    pub fn new(delta: IVec2) -> Self {
        Self { delta, priority: 0 }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl MoveRequest for PushRequest {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn process(&self, entity: &EntityState, world: &World) -> Result<EntityMove, SimError> {
        if !entity.alive {
            return Err(SimError::DeadEntity(entity.id));
        }
        Ok(step_move(entity, world, self.delta))
    }
}
