/*
 * server/src/utils.rs
 *
 * Small geometry helpers shared by the world-facing modules.
 */

use crate::TILE_SIZE_PX;

/// Calculates the squared distance between two 2D points.
#[inline]
pub fn get_distance_squared(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x1 - x2;
    let dy = y1 - y2;
    dx * dx + dy * dy
}

/// World pixel position of a tile's center. Tile z maps onto the 2D world's y axis.
pub fn tile_center_px(tile_x: i32, tile_z: i32) -> (f32, f32) {
    let size = TILE_SIZE_PX as f32;
    (tile_x as f32 * size + size / 2.0, tile_z as f32 * size + size / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_is_symmetric() {
        assert_eq!(get_distance_squared(0.0, 0.0, 3.0, 4.0), 25.0);
        assert_eq!(get_distance_squared(3.0, 4.0, 0.0, 0.0), 25.0);
    }

    #[test]
    fn tile_centers_sit_half_a_tile_in() {
        let half = TILE_SIZE_PX as f32 / 2.0;
        assert_eq!(tile_center_px(0, 0), (half, half));
        assert_eq!(tile_center_px(2, 1), (2.0 * TILE_SIZE_PX as f32 + half, TILE_SIZE_PX as f32 + half));
    }
}
