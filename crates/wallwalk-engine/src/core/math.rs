// core/math.rs
//
// Orientation algebra shared by surfaces, moves and brains.
// Rotations are radians, counter-clockwise; rotation 0 means "up" is +Y.

use std::f32::consts::{PI, TAU};

use glam::{IVec2, Vec2};

/// Default tolerance when matching a desired up vector against surface normals.
pub const DEFAULT_MAX_NORMAL_DELTA_DEG: f32 = 60.0;

/// The up vector of an entity or obstacle with the given rotation.
#[inline]
pub fn up_from_rotation(rotation: f32) -> Vec2 {
    Vec2::from_angle(rotation).rotate(Vec2::Y)
}

/// The rotation whose up vector points along `up`.
#[inline]
pub fn rotation_from_up(up: Vec2) -> f32 {
    if up == Vec2::ZERO {
        return 0.0;
    }
    Vec2::Y.angle_to(up)
}

/// Unsigned angle between two directions, in degrees.
/// A zero vector matches nothing (180°).
pub fn angle_between_deg(a: Vec2, b: Vec2) -> f32 {
    if a == Vec2::ZERO || b == Vec2::ZERO {
        return 180.0;
    }
    a.angle_to(b).abs().to_degrees()
}

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Signed shortest-arc delta from `from` to `to`.
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Tangent along a surface for an entity facing `facing` (+1 or -1).
/// With up = +Y and facing +1 this is +X.
#[inline]
pub fn forward_from_up(up: Vec2, facing: i32) -> Vec2 {
    Vec2::new(up.y, -up.x) * facing.signum() as f32
}

/// Snap a direction to the nearest cell delta (diagonals included).
#[inline]
pub fn to_cell_delta(direction: Vec2) -> IVec2 {
    direction.round().as_ivec2()
}

/// Rotate a cell offset counter-clockwise by `quarter_turns` × 90°.
pub fn quarter_turn(offset: IVec2, quarter_turns: u8) -> IVec2 {
    match quarter_turns % 4 {
        0 => offset,
        1 => IVec2::new(-offset.y, offset.x),
        2 => IVec2::new(-offset.x, -offset.y),
        _ => IVec2::new(offset.y, -offset.x),
    }
}

/// Rotation in radians for a quarter-turn orientation.
#[inline]
pub fn quarter_turn_radians(quarter_turns: u8) -> f32 {
    (quarter_turns % 4) as f32 * PI * 0.5
}
