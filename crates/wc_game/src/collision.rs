//! Grid collision for level walls and ladders.
//!
//! Level geometry that matters to gameplay lives on a uniform grid: every wall
//! layer contributes solid cells and the ladder layer contributes climbable
//! cells. Lookups are a `HashSet` probe per cell, so no broad phase is needed.
//!
//! Movement is **axis-separable move-and-slide**: X is resolved first, then Y
//! using the corrected X. This prevents diagonal tunneling and gives the
//! expected slide along walls.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct GridOrigin {
    pub x: f32,
    pub y: f32,
}

/// Shape of a level grid: cell size in world pixels and extent in cells.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub cell_size: f32,
    #[serde(default)]
    pub origin: GridOrigin,
    pub width: i32,
    pub height: i32,
}

impl GridSpec {
    pub fn contains(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.cell_size
    }

    /// Bottom-left world corner of a cell.
    pub fn cell_origin(&self, cell: GridCell) -> (f32, f32) {
        (
            self.origin.x + cell.x as f32 * self.cell_size,
            self.origin.y + cell.y as f32 * self.cell_size,
        )
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn left(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Aabb {
        Aabb {
            center_x: self.center_x + dx,
            center_y: self.center_y + dy,
            ..*self
        }
    }

    /// Strict overlap; boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.bottom() < other.top()
            && other.bottom() < self.top()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionMoveResult {
    pub aabb: Aabb,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_down: bool,
    pub blocked_up: bool,
}

impl CollisionMoveResult {
    pub fn blocked_vertically(&self) -> bool {
        self.blocked_down || self.blocked_up
    }

    /// Blocked sides for the debug overlay, e.g. `"right down"`.
    pub fn contact_label(&self) -> String {
        let sides = [
            (self.blocked_left, "left"),
            (self.blocked_right, "right"),
            (self.blocked_down, "down"),
            (self.blocked_up, "up"),
        ];
        let names: Vec<&str> = sides
            .iter()
            .filter(|(blocked, _)| *blocked)
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(" ")
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollisionGrid {
    pub spec: GridSpec,
    cells: HashSet<GridCell>,
}

impl CollisionGrid {
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            cells: HashSet::new(),
        }
    }

    pub fn from_cells(spec: GridSpec, cells: impl IntoIterator<Item = GridCell>) -> Self {
        let mut grid = Self::new(spec);
        grid.merge(cells);
        grid
    }

    /// Adds cells to the set; out-of-grid cells are ignored.
    pub fn merge(&mut self, cells: impl IntoIterator<Item = GridCell>) {
        let spec = self.spec;
        self.cells
            .extend(cells.into_iter().filter(|cell| spec.contains(*cell)));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.cells.contains(&GridCell { x, y })
    }

    /// True when any cell under the box is set.
    pub fn overlaps(&self, aabb: Aabb) -> bool {
        const EPS: f32 = 0.001;
        let x0 = self.world_to_cell_x(aabb.left() + EPS);
        let x1 = self.world_to_cell_x(aabb.right() - EPS);
        let y0 = self.world_to_cell_y(aabb.bottom() + EPS);
        let y1 = self.world_to_cell_y(aabb.top() - EPS);
        (y0..=y1).any(|y| (x0..=x1).any(|x| self.is_solid(x, y)))
    }

    pub fn move_and_collide_detailed(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        const EPS: f32 = 0.0001;

        let resolved_x = self.resolve_axis_x(aabb, dx);
        let collided_x = (resolved_x - (aabb.center_x + dx)).abs() > EPS;

        let mut moved = aabb;
        moved.center_x = resolved_x;
        let resolved_y = self.resolve_axis_y(moved, dy);
        let collided_y = (resolved_y - (aabb.center_y + dy)).abs() > EPS;
        moved.center_y = resolved_y;

        CollisionMoveResult {
            aabb: moved,
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            blocked_down: collided_y && dy < 0.0,
            blocked_up: collided_y && dy > 0.0,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let y0 = self.world_to_cell_y(aabb.bottom() + EPS);
        let y1 = self.world_to_cell_y(aabb.top() - EPS);

        if dx > 0.0 {
            let first = self.world_to_cell_x(aabb.right() - EPS);
            let last = self.world_to_cell_x(candidate_x + aabb.half_w - EPS);
            'sweep_right: for x_cell in first..=last {
                for y in y0..=y1 {
                    if self.is_solid(x_cell, y) {
                        candidate_x = candidate_x.min(self.cell_left_world(x_cell) - aabb.half_w);
                        break 'sweep_right;
                    }
                }
            }
            // Never push against the direction of travel.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let first = self.world_to_cell_x(aabb.left() + EPS);
            let last = self.world_to_cell_x(candidate_x - aabb.half_w + EPS);
            'sweep_left: for x_cell in (last..=first).rev() {
                for y in y0..=y1 {
                    if self.is_solid(x_cell, y) {
                        candidate_x = candidate_x.max(self.cell_right_world(x_cell) + aabb.half_w);
                        break 'sweep_left;
                    }
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        candidate_x
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let x0 = self.world_to_cell_x(aabb.left() + EPS);
        let x1 = self.world_to_cell_x(aabb.right() - EPS);

        if dy > 0.0 {
            let first = self.world_to_cell_y(aabb.top() - EPS);
            let last = self.world_to_cell_y(candidate_y + aabb.half_h - EPS);
            'sweep_up: for y_cell in first..=last {
                for x in x0..=x1 {
                    if self.is_solid(x, y_cell) {
                        candidate_y = candidate_y.min(self.cell_bottom_world(y_cell) - aabb.half_h);
                        break 'sweep_up;
                    }
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let first = self.world_to_cell_y(aabb.bottom() + EPS);
            let last = self.world_to_cell_y(candidate_y - aabb.half_h + EPS);
            'sweep_down: for y_cell in (last..=first).rev() {
                for x in x0..=x1 {
                    if self.is_solid(x, y_cell) {
                        candidate_y = candidate_y.max(self.cell_top_world(y_cell) + aabb.half_h);
                        break 'sweep_down;
                    }
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        candidate_y
    }

    fn world_to_cell_x(&self, world_x: f32) -> i32 {
        ((world_x - self.spec.origin.x) / self.spec.cell_size).floor() as i32
    }

    fn world_to_cell_y(&self, world_y: f32) -> i32 {
        ((world_y - self.spec.origin.y) / self.spec.cell_size).floor() as i32
    }

    fn cell_left_world(&self, x: i32) -> f32 {
        self.spec.origin.x + x as f32 * self.spec.cell_size
    }

    fn cell_right_world(&self, x: i32) -> f32 {
        self.spec.origin.x + (x + 1) as f32 * self.spec.cell_size
    }

    fn cell_bottom_world(&self, y: i32) -> f32 {
        self.spec.origin.y + y as f32 * self.spec.cell_size
    }

    fn cell_top_world(&self, y: i32) -> f32 {
        self.spec.origin.y + (y + 1) as f32 * self.spec.cell_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> GridSpec {
        GridSpec {
            cell_size: 32.0,
            origin: GridOrigin::default(),
            width: 8,
            height: 8,
        }
    }

    fn boxed(center_x: f32, center_y: f32) -> Aabb {
        Aabb {
            center_x,
            center_y,
            half_w: 8.0,
            half_h: 8.0,
        }
    }

    #[test]
    fn merge_combines_layers_and_drops_out_of_grid_cells() {
        let mut grid = CollisionGrid::from_cells(spec(), [GridCell { x: 0, y: 0 }]);
        grid.merge([GridCell { x: 1, y: 0 }, GridCell { x: 0, y: 0 }, GridCell { x: 99, y: 0 }]);
        assert_eq!(grid.len(), 2);
        assert!(grid.is_solid(1, 0));
        assert!(!grid.is_solid(99, 0));
    }

    #[test]
    fn move_and_collide_blocks_motion_into_wall() {
        let grid = CollisionGrid::from_cells(spec(), [GridCell { x: 2, y: 1 }]);
        let start = boxed(40.0, 40.0);
        let moved = grid.move_and_collide_detailed(start, 40.0, 0.0);
        assert!(moved.aabb.center_x <= 64.0 - start.half_w + 0.001);
        assert!(moved.blocked_right);
        assert!(!moved.blocked_left);
        assert!(!moved.blocked_vertically());
        assert_eq!(moved.contact_label(), "right");
    }

    #[test]
    fn fast_fall_does_not_tunnel_through_thin_floor() {
        let grid = CollisionGrid::from_cells(spec(), [GridCell { x: 1, y: 1 }]);
        // Falling 60px in one step from above the floor cell at y = 32..64.
        let moved = grid.move_and_collide_detailed(boxed(48.0, 100.0), 0.0, -60.0);
        assert!(moved.blocked_down);
        assert!((moved.aabb.center_y - 72.0).abs() < 0.001);
        assert_eq!(moved.contact_label(), "down");
    }

    #[test]
    fn move_up_against_side_obstacle_does_not_push_downward() {
        let floor = (0..4).map(|x| GridCell { x, y: 0 });
        let grid = CollisionGrid::from_cells(spec(), floor.chain([GridCell { x: 2, y: 1 }]));
        let start = boxed(48.0, 40.0);
        let moved = grid.move_and_collide_detailed(start, 0.0, 10.0);
        assert!(moved.aabb.center_y >= start.center_y - 0.0001);
    }

    #[test]
    fn overlaps_detects_cells_under_box() {
        let grid = CollisionGrid::from_cells(spec(), [GridCell { x: 1, y: 0 }]);
        assert!(grid.overlaps(boxed(40.0, 30.0)));
        // Resting exactly on top of the cell is not an overlap.
        assert!(!grid.overlaps(boxed(40.0, 40.0)));
        assert!(grid.overlaps(boxed(40.0, 40.0).offset(0.0, -5.0)));
    }

    #[test]
    fn aabb_intersection_is_strict() {
        let a = boxed(0.0, 0.0);
        assert!(a.intersects(&boxed(10.0, 0.0)));
        assert!(!a.intersects(&boxed(16.0, 0.0)));
    }
}
