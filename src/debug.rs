//! Line-based debug visualization of the particle grid.

use crate::grid::SkirtGrid;
use alloc::vec::Vec;
use glam::Vec3;

/// Sink for debug lines. Drawing never feeds back into the simulation.
pub trait DebugDraw {
    fn line(&mut self, from: Vec3, to: Vec3);
}

/// Collects lines into a list, mostly for tests and offline tools.
impl DebugDraw for Vec<(Vec3, Vec3)> {
    fn line(&mut self, from: Vec3, to: Vec3) {
        self.push((from, to));
    }
}

/// Emits every ring edge, then for each particle above the last ring the
/// vertical edge to the particle below it.
pub fn draw_grid<D: DebugDraw + ?Sized>(grid: &SkirtGrid, draw: &mut D) {
    let rings = grid.ring_count();
    for r in 0..rings {
        for s in 0..grid.segment_count() {
            let here = grid.position_at(r, s);
            draw.line(here, grid.position_at(r, grid.next_segment(s)));
            if r + 1 < rings {
                draw.line(here, grid.position_at(r + 1, s));
            }
        }
    }
}
