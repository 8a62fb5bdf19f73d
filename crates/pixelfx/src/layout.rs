use std::f32::consts::PI;

use effectconfig::LayoutMode;

/// Each quad is drawn slightly larger than its cell so the filter's block
/// sampling never exposes seams along cell edges.
pub const OVERSIZE_FACTOR: f32 = 1.05;

/// Rotation applied to the top row in grid mode; the table surface is viewed
/// from both sides.
pub const GRID_TOP_ROW_ROTATION: f32 = PI;

/// Centre-anchored position, size and rotation (radians) of one drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub rotation: f32,
}

/// Lays out the overlay quads for a scene of `width` x `height` pixels.
///
/// Grid placements are row-major with row 0 at the top.
pub fn placements(layout: LayoutMode, width: f32, height: f32) -> Vec<Placement> {
    match layout {
        LayoutMode::Single => vec![Placement {
            center: [width / 2.0, height / 2.0],
            size: [width * OVERSIZE_FACTOR, height * OVERSIZE_FACTOR],
            rotation: 0.0,
        }],
        LayoutMode::Grid => {
            let cell_w = width / 2.0;
            let cell_h = height / 2.0;
            let mut cells = Vec::with_capacity(4);
            for row in 0..2 {
                for col in 0..2 {
                    cells.push(Placement {
                        center: [cell_w * (col as f32 + 0.5), cell_h * (row as f32 + 0.5)],
                        size: [cell_w * OVERSIZE_FACTOR, cell_h * OVERSIZE_FACTOR],
                        rotation: if row == 0 { GRID_TOP_ROW_ROTATION } else { 0.0 },
                    });
                }
            }
            cells
        }
    }
}
