use bytemuck::{Pod, Zeroable};

use crate::components::entity::EntityState;

/// Lifecycle codes written into `PoseInstance::state`.
pub const POSE_STANDING: f32 = 0.0;
pub const POSE_FALLING: f32 = 1.0;
pub const POSE_DEAD: f32 = 2.0;
pub const POSE_FINISHED: f32 = 3.0;

/// Per-entity pose handed to the renderer/animation layer.
/// 8 floats = 32 bytes stride; the layout is the interop contract.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PoseInstance {
    /// X position in world space.
    pub x: f32,
    /// Y position in world space.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub vx: f32,
    pub vy: f32,
    /// One of the `POSE_*` codes.
    pub state: f32,
    pub cell_x: f32,
    pub cell_y: f32,
}

impl PoseInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn from_state(state: &EntityState) -> Self {
        let code = if !state.alive {
            POSE_DEAD
        } else if state.goal_reached {
            POSE_FINISHED
        } else if state.is_falling() {
            POSE_FALLING
        } else {
            POSE_STANDING
        };
        Self {
            x: state.position.x,
            y: state.position.y,
            rotation: state.rotation,
            vx: state.velocity.x,
            vy: state.velocity.y,
            state: code,
            cell_x: state.cell.x as f32,
            cell_y: state.cell.y as f32,
        }
    }
}

/// Pose instances for one frame, in scene order.
#[derive(Debug)]
pub struct PoseBuffer {
    pub instances: Vec<PoseInstance>,
}

impl PoseBuffer {
    pub fn new() -> Self {
        Self {
            instances: Vec::with_capacity(64),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: PoseInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Flat float view for copying into a shared buffer.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for PoseBuffer {
    fn default() -> Self {
        Self::new()
    }
}
