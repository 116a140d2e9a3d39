//! Pure logic: cardinal rotation of in-piece positions, of named block-state
//! properties, and of the grid-step vector used to place multi-piece
//! structures. See spec.md §4.3.

use crate::block::BlockData;
use crate::error::{LseError, Result};
use crate::structure::GridCoordinate;

/// Normalizes any integer rotation to `0 | 90 | 180 | 270`, rejecting
/// anything outside the accepted set `{0, 90, 180, 270, -90}` per spec.md §6.
pub fn normalize_rotation(r: i32) -> Result<i32> {
    if !matches!(r, 0 | 90 | 180 | 270 | -90) {
        return Err(LseError::InvalidRotation(r));
    }
    Ok(((r % 360) + 360) % 360)
}

pub struct RotationHelper;

impl RotationHelper {
    /// Rotates an in-piece `(x, z)` index about the piece's own bounding
    /// box; `y` is never touched by cardinal rotation.
    pub fn rotate_position(x: i32, z: i32, r: i32, size_x: i32, size_z: i32) -> (i32, i32) {
        match r {
            0 => (x, z),
            90 => (size_z - 1 - z, x),
            180 => (size_x - 1 - x, size_z - 1 - z),
            270 => (z, size_x - 1 - x),
            _ => (x, z),
        }
    }

    /// Rewrites `facing`/`axis`/`rotation`/compass-boolean properties under
    /// the same cardinal cycle; any other property passes through untouched.
    pub fn rotate_block_state(block: &BlockData, r: i32) -> BlockData {
        if r == 0 {
            return block.clone();
        }

        let mut rotated = BlockData::new(block.name.clone());
        for (key, value) in &block.properties {
            match key.as_str() {
                "facing" => {
                    rotated.set_property(key.clone(), rotate_facing(value, r));
                }
                "axis" => {
                    rotated.set_property(key.clone(), rotate_axis(value, r));
                }
                "rotation" => {
                    rotated.set_property(key.clone(), rotate_numeric_rotation(value, r));
                }
                "north" | "south" | "east" | "west" => {
                    let new_key = rotate_compass(key, r);
                    rotated.set_property(new_key, value.clone());
                }
                _ => {
                    rotated.set_property(key.clone(), value.clone());
                }
            }
        }
        rotated
    }

    /// Builds a function translating a piece's grid coordinate into the
    /// world-space origin of that piece, given the structure's placement
    /// origin and rotation. The grid-step displacement is treated as a free
    /// vector (no bounding-box reflection is possible here — the total grid
    /// extent isn't known at this call site).
    pub fn piece_origin_calculator(
        origin_world: (i32, i32, i32),
        r: i32,
        piece_size: (i32, i32, Option<i32>),
    ) -> impl Fn(GridCoordinate) -> (i32, i32, i32) {
        let (piece_x, piece_z, piece_y) = piece_size;
        move |coord: GridCoordinate| {
            let step_x = coord.gx * piece_x;
            let step_z = coord.gz * piece_z;
            let (rx, rz) = Self::rotate_vector(step_x, step_z, r);
            let step_y = piece_y.map(|p| coord.gy * p).unwrap_or(0);
            (origin_world.0 + rx, origin_world.1 + step_y, origin_world.2 + rz)
        }
    }

    /// Rotates a free displacement vector about the origin — no
    /// bounding-box reflection, unlike [`Self::rotate_position`]. Used for
    /// the grid-step vector and for any other offset that isn't itself an
    /// in-piece coordinate (e.g. a centered placement's half-extent shift).
    pub fn rotate_vector(dx: i32, dz: i32, r: i32) -> (i32, i32) {
        rotate_vector(dx, dz, r)
    }

    /// Reflects an in-piece `(x, z)` index across the given axis. Supplements
    /// the cardinal rotation algebra the same way the teacher's
    /// `Region::flip_x`/`flip_z` supplement its own rotation; Y-axis
    /// mirroring is deliberately not offered (spec.md never asks the engine
    /// to reason about gravity-sensitive block shapes).
    pub fn mirror_position(x: i32, z: i32, axis: MirrorAxis, size_x: i32, size_z: i32) -> (i32, i32) {
        match axis {
            MirrorAxis::X => (size_x - 1 - x, z),
            MirrorAxis::Z => (x, size_z - 1 - z),
        }
    }

    /// Mirrors `facing`/compass-boolean properties across `axis`; `axis`
    /// and numeric `rotation` properties pass through unchanged, matching
    /// the teacher's flip implementation (it only rewrites directional
    /// facings, not block-shape axis markers).
    pub fn mirror_block_state(block: &BlockData, axis: MirrorAxis) -> BlockData {
        let mut mirrored = BlockData::new(block.name.clone());
        for (key, value) in &block.properties {
            match key.as_str() {
                "facing" => mirrored.set_property(key.clone(), mirror_facing(value, axis)),
                "north" | "south" if axis == MirrorAxis::Z => {
                    let new_key = if key == "north" { "south" } else { "north" };
                    mirrored.set_property(new_key, value.clone());
                }
                "east" | "west" if axis == MirrorAxis::X => {
                    let new_key = if key == "east" { "west" } else { "east" };
                    mirrored.set_property(new_key, value.clone());
                }
                _ => mirrored.set_property(key.clone(), value.clone()),
            }
        }
        mirrored
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAxis {
    X,
    Z,
}

fn mirror_facing(value: &str, axis: MirrorAxis) -> String {
    match (value, axis) {
        ("north", MirrorAxis::Z) => "south".to_string(),
        ("south", MirrorAxis::Z) => "north".to_string(),
        ("east", MirrorAxis::X) => "west".to_string(),
        ("west", MirrorAxis::X) => "east".to_string(),
        _ => value.to_string(),
    }
}

/// Pure rotation of a free displacement vector about the origin (no
/// reflection term, unlike [`RotationHelper::rotate_position`]).
fn rotate_vector(dx: i32, dz: i32, r: i32) -> (i32, i32) {
    match r {
        0 => (dx, dz),
        90 => (-dz, dx),
        180 => (-dx, -dz),
        270 => (dz, -dx),
        _ => (dx, dz),
    }
}

const COMPASS: [&str; 4] = ["north", "east", "south", "west"];

fn compass_steps(r: i32) -> usize {
    match r {
        90 => 1,
        180 => 2,
        270 => 3,
        _ => 0,
    }
}

fn rotate_compass(key: &str, r: i32) -> String {
    let steps = compass_steps(r);
    match COMPASS.iter().position(|c| *c == key) {
        Some(idx) => COMPASS[(idx + steps) % 4].to_string(),
        None => key.to_string(),
    }
}

fn rotate_facing(value: &str, r: i32) -> String {
    if value == "up" || value == "down" {
        return value.to_string();
    }
    rotate_compass(value, r)
}

fn rotate_axis(value: &str, r: i32) -> String {
    match (value, r) {
        ("x", 90) | ("x", 270) => "z".to_string(),
        ("z", 90) | ("z", 270) => "x".to_string(),
        _ => value.to_string(),
    }
}

/// 16-step directional `rotation` property (banners, signs): each 90°
/// cardinal step advances it by 4 of its 16 steps.
fn rotate_numeric_rotation(value: &str, r: i32) -> String {
    let Ok(current) = value.parse::<i32>() else {
        return value.to_string();
    };
    let steps = (compass_steps(r) as i32) * 4;
    (((current + steps) % 16 + 16) % 16).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_normalized_and_rejects_invalid_values() {
        assert_eq!(normalize_rotation(0).unwrap(), 0);
        assert_eq!(normalize_rotation(-90).unwrap(), 270);
        assert_eq!(normalize_rotation(270).unwrap(), 270);
        assert!(normalize_rotation(45).is_err());
    }

    #[test]
    fn rotate_position_four_times_is_identity() {
        let (sx, sz) = (5, 7);
        let (mut x, mut z) = (2, 3);
        for _ in 0..4 {
            (x, z) = RotationHelper::rotate_position(x, z, 90, sx, sz);
        }
        assert_eq!((x, z), (2, 3));
    }

    #[test]
    fn rotate_position_90_and_270_are_inverses() {
        let (sx, sz) = (4, 6);
        let (x, z) = (1, 2);
        let (rx, rz) = RotationHelper::rotate_position(x, z, 90, sx, sz);
        let (sz2, sx2) = (sx, sz); // rotated piece's new bounding box is swapped
        let (ox, oz) = RotationHelper::rotate_position(rx, rz, 270, sz2, sx2);
        assert_eq!((ox, oz), (x, z));
    }

    #[test]
    fn scenario_rotation_90_matches_spec_example() {
        // 3x3x3 cube, diamond at relative (0,0,0), stairs at relative (1,0,0) facing north.
        let (size_x, size_z) = (3, 3);
        let (dx, dz) = RotationHelper::rotate_position(0, 0, 90, size_x, size_z);
        assert_eq!((dx, dz), (2, 0));

        let (sx, sz) = RotationHelper::rotate_position(1, 0, 90, size_x, size_z);
        assert_eq!((sx, sz), (2, 1));

        let stairs = BlockData::new("minecraft:spruce_stairs").with_property("facing", "north");
        let rotated = RotationHelper::rotate_block_state(&stairs, 90);
        assert_eq!(rotated.get_property("facing").map(|s| s.as_str()), Some("east"));
    }

    #[test]
    fn compass_boolean_properties_are_renamed_not_toggled() {
        let fence = BlockData::new("minecraft:oak_fence").with_property("north", "true");
        let rotated = RotationHelper::rotate_block_state(&fence, 90);
        assert_eq!(rotated.get_property("east").map(|s| s.as_str()), Some("true"));
        assert!(rotated.get_property("north").is_none());
    }

    #[test]
    fn piece_origin_calculator_rotates_grid_step() {
        let calc = RotationHelper::piece_origin_calculator((100, 60, 100), 90, (48, 48, None));
        let origin = calc(GridCoordinate::new(1, 0, 2));
        // step (48, 96) rotated 90 -> (-96, 48)
        assert_eq!(origin, (100 - 96, 60, 100 + 48));
    }

    #[test]
    fn mirror_position_reflects_across_the_chosen_axis() {
        assert_eq!(RotationHelper::mirror_position(1, 2, MirrorAxis::X, 5, 5), (3, 2));
        assert_eq!(RotationHelper::mirror_position(1, 2, MirrorAxis::Z, 5, 5), (1, 2));
    }

    #[test]
    fn mirror_block_state_flips_facing_on_the_mirrored_axis_only() {
        let stairs = BlockData::new("minecraft:oak_stairs").with_property("facing", "north");
        let mirrored_z = RotationHelper::mirror_block_state(&stairs, MirrorAxis::Z);
        assert_eq!(mirrored_z.get_property("facing").map(|s| s.as_str()), Some("south"));

        let mirrored_x = RotationHelper::mirror_block_state(&stairs, MirrorAxis::X);
        assert_eq!(mirrored_x.get_property("facing").map(|s| s.as_str()), Some("north"));
    }
}
