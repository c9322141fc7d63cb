//! Pathfinding grid: a discretized walkability map over the town.
//!
//! Continuous world coordinates project onto integer cells through a fixed
//! scale and offset, so negative world coordinates still land on the grid:
//!
//! ```text
//! cell.x = floor(world.x * scale) + offset_x
//! ```
//!
//! Every building footprint and every blocking decor disc is rasterized as
//! blocked. The grid is rebuilt from the registries whenever either set
//! changes.
//!
//! [`PathGrid::find_path`] runs an 8-directional A* where diagonal and
//! orthogonal steps cost the same and corner cutting is allowed. With
//! uniform step cost the Chebyshev distance is an exact lower bound, so
//! the returned path is shortest by step count.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use townsfolk_types::{Building, Position};
use tracing::debug;

use crate::buildings::BuildingRegistry;
use crate::decor::DecorRegistry;
use crate::error::WorldError;

/// The eight neighbor offsets, orthogonal first.
const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Tolerance added before flooring so that cell corners converted to world
/// coordinates and back land in the same cell.
const PROJECTION_EPSILON: f64 = 1e-9;

/// An integer grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Create a cell.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 8-directional step distance to `other`.
    pub fn steps_to(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Grid dimensions and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns (default: 100).
    #[serde(default = "default_size")]
    pub width: u32,

    /// Number of rows (default: 100).
    #[serde(default = "default_size")]
    pub height: u32,

    /// Cells per world unit (default: 1.0).
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Column of world x = 0 (default: 50).
    #[serde(default = "default_offset")]
    pub offset_x: i32,

    /// Row of world y = 0 (default: 50).
    #[serde(default = "default_offset")]
    pub offset_y: i32,

    /// Side length, in cells, of buildings without explicit footprint
    /// (default: 1).
    #[serde(default = "default_footprint")]
    pub default_footprint: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            scale: default_scale(),
            offset_x: default_offset(),
            offset_y: default_offset(),
            default_footprint: default_footprint(),
        }
    }
}

const fn default_size() -> u32 {
    100
}

const fn default_scale() -> f64 {
    1.0
}

const fn default_offset() -> i32 {
    50
}

const fn default_footprint() -> u32 {
    1
}

/// Walkability map plus shortest-path search.
#[derive(Debug, Clone)]
pub struct PathGrid {
    config: GridConfig,
    width: usize,
    height: usize,
    blocked: Vec<bool>,
}

impl PathGrid {
    /// Create an all-walkable grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] for zero dimensions or a
    /// non-positive scale.
    pub fn new(config: GridConfig) -> Result<Self, WorldError> {
        if config.width == 0 || config.height == 0 {
            return Err(WorldError::InvalidGrid {
                reason: format!("dimensions must be positive, got {}x{}", config.width, config.height),
            });
        }
        if !config.scale.is_finite() || config.scale <= 0.0 {
            return Err(WorldError::InvalidGrid {
                reason: format!("scale must be positive, got {}", config.scale),
            });
        }
        let width = usize::try_from(config.width).map_err(|e| WorldError::InvalidGrid {
            reason: e.to_string(),
        })?;
        let height = usize::try_from(config.height).map_err(|e| WorldError::InvalidGrid {
            reason: e.to_string(),
        })?;
        let len = width.checked_mul(height).ok_or_else(|| WorldError::InvalidGrid {
            reason: String::from("grid too large"),
        })?;
        Ok(Self {
            config,
            width,
            height,
            blocked: vec![false; len],
        })
    }

    /// Create a grid and rasterize the given buildings and decor.
    ///
    /// # Errors
    ///
    /// Same as [`PathGrid::new`].
    pub fn build(
        config: GridConfig,
        buildings: &BuildingRegistry,
        decor: &DecorRegistry,
    ) -> Result<Self, WorldError> {
        let mut grid = Self::new(config)?;
        grid.rebuild(buildings, decor);
        Ok(grid)
    }

    /// Clear the grid and rasterize every building footprint and blocking
    /// decor element again.
    pub fn rebuild(&mut self, buildings: &BuildingRegistry, decor: &DecorRegistry) {
        self.blocked.fill(false);
        for building in buildings.get_buildings() {
            for cell in self.footprint_cells(building) {
                let _ = self.set_blocked(cell, true);
            }
        }
        for element in decor.get_blocking_elements() {
            self.block_disc(element.position, element.radius);
        }
        debug!(
            width = self.width,
            height = self.height,
            blocked = self.blocked_count(),
            "Pathfinding grid rebuilt"
        );
    }

    /// Projection parameters.
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    /// Project a world position onto its cell.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_cell(&self, position: Position) -> Cell {
        let scale = self.config.scale;
        // `as` saturates on out-of-range floats; such cells are out of bounds anyway.
        let x = (position.x * scale + PROJECTION_EPSILON).floor() as i32;
        let y = (position.y * scale + PROJECTION_EPSILON).floor() as i32;
        Cell::new(
            x.saturating_add(self.config.offset_x),
            y.saturating_add(self.config.offset_y),
        )
    }

    /// World position of a cell's origin corner.
    pub fn to_world(&self, cell: Cell) -> Position {
        let scale = self.config.scale;
        Position::new(
            f64::from(cell.x.saturating_sub(self.config.offset_x)) / scale,
            f64::from(cell.y.saturating_sub(self.config.offset_y)) / scale,
        )
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let x = usize::try_from(cell.x).ok()?;
        let y = usize::try_from(cell.y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x)
    }

    fn cell_at(&self, index: usize) -> Option<Cell> {
        let x = i32::try_from(index % self.width).ok()?;
        let y = i32::try_from(index / self.width).ok()?;
        Some(Cell::new(x, y))
    }

    fn blocked_at(&self, index: usize) -> bool {
        self.blocked.get(index).copied().unwrap_or(true)
    }

    /// Whether `cell` lies on the grid.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.index(cell).is_some()
    }

    /// Whether `cell` is on the grid and not blocked.
    pub fn is_walkable_cell(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| !self.blocked_at(i))
    }

    /// Whether the cell under a world position is on the grid and not
    /// blocked.
    pub fn is_walkable(&self, position: Position) -> bool {
        self.is_walkable_cell(self.to_cell(position))
    }

    /// Mark or clear one cell. Returns `false` if the cell is off-grid.
    pub fn set_blocked(&mut self, cell: Cell, blocked: bool) -> bool {
        let Some(slot) = self.index(cell).and_then(|i| self.blocked.get_mut(i)) else {
            return false;
        };
        *slot = blocked;
        true
    }

    /// Footprint origin cell and size (in cells) of a building.
    fn footprint_rect(&self, building: &Building) -> (Cell, i32, i32) {
        let fallback = self.config.default_footprint;
        let (w, h) = building
            .footprint
            .map_or((fallback, fallback), |f| (f.width, f.height));
        let to_i32 = |n: u32| i32::try_from(n.max(1)).unwrap_or(i32::MAX);
        (self.to_cell(building.position), to_i32(w), to_i32(h))
    }

    /// Cells covered by a building.
    pub fn footprint_cells(&self, building: &Building) -> Vec<Cell> {
        let (origin, w, h) = self.footprint_rect(building);
        (0..h)
            .flat_map(|dy| (0..w).map(move |dx| origin.offset(dx, dy)))
            .collect()
    }

    /// Block every cell whose distance to the center cell is within
    /// `radius` world units.
    #[allow(clippy::cast_possible_truncation)]
    fn block_disc(&mut self, center: Position, radius: f64) {
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        let center = self.to_cell(center);
        let reach_cells = radius * self.config.scale;
        let limit = self.width.max(self.height);
        let reach = (reach_cells.ceil() as i32).min(i32::try_from(limit).unwrap_or(i32::MAX));
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if f64::from(dx).hypot(f64::from(dy)) <= reach_cells {
                    let _ = self.set_blocked(center.offset(dx, dy), true);
                }
            }
        }
    }

    /// A walkable cell touching the building's footprint (8-neighborhood),
    /// nearest to `from`.
    pub fn free_cell_near_building(&self, building: &Building, from: Position) -> Option<Position> {
        let (origin, w, h) = self.footprint_rect(building);
        let mut best: Option<(f64, Position)> = None;
        for dy in -1..=h {
            for dx in -1..=w {
                let on_ring = dx == -1 || dy == -1 || dx == w || dy == h;
                if !on_ring {
                    continue;
                }
                let cell = origin.offset(dx, dy);
                if !self.is_walkable_cell(cell) {
                    continue;
                }
                let position = self.to_world(cell);
                let distance = position.distance_to(from);
                if best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, position));
                }
            }
        }
        best.map(|(_, position)| position)
    }

    /// Shortest 8-directional path between two cells, both endpoints
    /// included.
    ///
    /// # Errors
    ///
    /// [`WorldError::OutOfBounds`] if either endpoint is off-grid,
    /// [`WorldError::GoalBlocked`] if the goal is an obstacle, and
    /// [`WorldError::NoPath`] if the goal is unreachable.
    pub fn find_cell_path(&self, start: Cell, goal: Cell) -> Result<Vec<Cell>, WorldError> {
        let start_index = self.index(start).ok_or(WorldError::OutOfBounds {
            x: start.x,
            y: start.y,
        })?;
        let goal_index = self.index(goal).ok_or(WorldError::OutOfBounds {
            x: goal.x,
            y: goal.y,
        })?;
        if self.blocked_at(goal_index) {
            return Err(WorldError::GoalBlocked {
                x: goal.x,
                y: goal.y,
            });
        }
        if start_index == goal_index {
            return Ok(vec![start]);
        }

        let len = self.blocked.len();
        let mut cost = vec![u32::MAX; len];
        let mut came_from: Vec<Option<usize>> = vec![None; len];
        let mut closed = vec![false; len];
        let mut open = BinaryHeap::new();

        if let Some(slot) = cost.get_mut(start_index) {
            *slot = 0;
        }
        let h = start.steps_to(goal);
        open.push(Reverse((h, h, start_index)));

        while let Some(Reverse((_, _, index))) = open.pop() {
            match closed.get_mut(index) {
                Some(done) if !*done => *done = true,
                _ => continue,
            }
            if index == goal_index {
                return Ok(self.reconstruct(&came_from, goal_index));
            }
            let Some(cell) = self.cell_at(index) else {
                continue;
            };
            let next_cost = cost.get(index).copied().unwrap_or(u32::MAX).saturating_add(1);

            for (dx, dy) in NEIGHBORS {
                let neighbor = cell.offset(dx, dy);
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if self.blocked_at(neighbor_index)
                    || closed.get(neighbor_index).copied().unwrap_or(true)
                {
                    continue;
                }
                let Some(known) = cost.get_mut(neighbor_index) else {
                    continue;
                };
                if next_cost < *known {
                    *known = next_cost;
                    if let Some(parent) = came_from.get_mut(neighbor_index) {
                        *parent = Some(index);
                    }
                    let h = neighbor.steps_to(goal);
                    open.push(Reverse((next_cost.saturating_add(h), h, neighbor_index)));
                }
            }
        }

        Err(WorldError::NoPath {
            from_x: start.x,
            from_y: start.y,
            to_x: goal.x,
            to_y: goal.y,
        })
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal_index: usize) -> Vec<Cell> {
        let mut path = Vec::new();
        let mut current = Some(goal_index);
        while let Some(index) = current {
            if let Some(cell) = self.cell_at(index) {
                path.push(cell);
            }
            current = came_from.get(index).copied().flatten();
        }
        path.reverse();
        path
    }

    /// Shortest path between two world positions, returned as the world
    /// positions of each cell (start cell first).
    ///
    /// # Errors
    ///
    /// Same as [`PathGrid::find_cell_path`].
    pub fn find_path(&self, start: Position, goal: Position) -> Result<Vec<Position>, WorldError> {
        let cells = self.find_cell_path(self.to_cell(start), self.to_cell(goal))?;
        Ok(cells.into_iter().map(|c| self.to_world(c)).collect())
    }

    /// Text map of the grid: `#` blocked, `.` walkable, and each mark's
    /// character drawn over its cell. Row 0 comes first.
    pub fn render_ascii(&self, marks: &[(Position, char)]) -> String {
        let mut rows: Vec<Vec<char>> = self
            .blocked
            .chunks(self.width)
            .map(|row| row.iter().map(|b| if *b { '#' } else { '.' }).collect())
            .collect();
        for (position, mark) in marks {
            let cell = self.to_cell(*position);
            let (Ok(x), Ok(y)) = (usize::try_from(cell.x), usize::try_from(cell.y)) else {
                continue;
            };
            if let Some(slot) = rows.get_mut(y).and_then(|row| row.get_mut(x)) {
                *slot = *mark;
            }
        }
        let mut out = String::with_capacity(self.blocked.len() + self.height);
        for row in rows {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use townsfolk_types::{BuildingType, DecorElement, DecorId};

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn small_config(size: u32) -> GridConfig {
        GridConfig {
            width: size,
            height: size,
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
            default_footprint: 1,
        }
    }

    fn make_building(x: f64, y: f64) -> Building {
        Building::new("Tavern", BuildingType::Tavern, Position::new(x, y), 10)
    }

    fn grid_with(buildings: Vec<Building>, size: u32) -> PathGrid {
        PathGrid::build(
            small_config(size),
            &BuildingRegistry::from_buildings(buildings),
            &DecorRegistry::new(),
        )
        .unwrap()
    }

    fn assert_path_clear(grid: &PathGrid, path: &[Position]) {
        for step in path {
            assert!(grid.is_walkable(*step), "path crosses blocked cell at {step}");
        }
        for pair in path.windows(2) {
            let (Some(a), Some(b)) = (pair.first(), pair.get(1)) else {
                continue;
            };
            assert_eq!(grid.to_cell(*a).steps_to(grid.to_cell(*b)), 1);
        }
    }

    #[test]
    fn projection_admits_negative_coordinates() {
        let grid = PathGrid::new(GridConfig::default()).unwrap();
        let cell = grid.to_cell(Position::new(-15.0, 7.0));
        assert_eq!(cell, Cell::new(35, 57));
        let back = grid.to_world(cell);
        assert!(approx(back.x, -15.0));
        assert!(approx(back.y, 7.0));
    }

    #[test]
    fn projection_round_trips_with_fractional_scale() {
        let config = GridConfig {
            scale: 3.0,
            ..GridConfig::default()
        };
        let grid = PathGrid::new(config).unwrap();
        for x in 0..20 {
            let cell = Cell::new(x, x);
            assert_eq!(grid.to_cell(grid.to_world(cell)), cell);
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let err = PathGrid::new(GridConfig {
            width: 0,
            ..GridConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, WorldError::InvalidGrid { .. }));

        let err = PathGrid::new(GridConfig {
            scale: -1.0,
            ..GridConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, WorldError::InvalidGrid { .. }));
    }

    #[test]
    fn footprint_is_rasterized() {
        let grid = grid_with(vec![make_building(10.0, 10.0).with_footprint(2, 3)], 20);
        assert_eq!(grid.blocked_count(), 6);
        assert!(!grid.is_walkable_cell(Cell::new(10, 10)));
        assert!(!grid.is_walkable_cell(Cell::new(11, 12)));
        assert!(grid.is_walkable_cell(Cell::new(12, 10)));
        assert!(grid.is_walkable_cell(Cell::new(10, 13)));
    }

    #[test]
    fn default_footprint_blocks_single_cell() {
        let grid = grid_with(vec![make_building(4.0, 4.0)], 10);
        assert_eq!(grid.blocked_count(), 1);
    }

    #[test]
    fn blocking_decor_blocks_disc() {
        let decor = DecorRegistry::from_elements([
            DecorElement {
                id: DecorId::new(),
                name: String::from("Fountain"),
                position: Position::new(5.0, 5.0),
                radius: 1.0,
                blocking: true,
            },
            DecorElement {
                id: DecorId::new(),
                name: String::from("Flowers"),
                position: Position::new(1.0, 1.0),
                radius: 3.0,
                blocking: false,
            },
        ]);
        let grid = PathGrid::build(small_config(10), &BuildingRegistry::new(), &decor).unwrap();
        // Center plus four orthogonal neighbors; diagonals are ~1.41 away.
        assert_eq!(grid.blocked_count(), 5);
        assert!(!grid.is_walkable_cell(Cell::new(6, 5)));
        assert!(grid.is_walkable_cell(Cell::new(6, 6)));
    }

    #[test]
    fn rebuild_picks_up_changes() {
        let mut buildings = BuildingRegistry::new();
        let decor = DecorRegistry::new();
        let mut grid = PathGrid::build(small_config(10), &buildings, &decor).unwrap();
        assert_eq!(grid.blocked_count(), 0);
        let id = buildings.insert(make_building(2.0, 2.0));
        grid.rebuild(&buildings, &decor);
        assert_eq!(grid.blocked_count(), 1);
        let _ = buildings.remove(id);
        grid.rebuild(&buildings, &decor);
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn open_field_path_is_chebyshev_length() {
        let grid = grid_with(Vec::new(), 20);
        let path = grid
            .find_path(Position::new(0.0, 0.0), Position::new(7.0, 3.0))
            .unwrap();
        assert_eq!(path.len(), 8);
        assert!(approx(path.first().unwrap().x, 0.0));
        let last = path.last().unwrap();
        assert!(approx(last.x, 7.0) && approx(last.y, 3.0));
        assert_path_clear(&grid, &path);
    }

    #[test]
    fn path_routes_around_footprint() {
        let grid = grid_with(vec![make_building(10.0, 10.0).with_footprint(2, 2)], 50);
        let path = grid
            .find_path(Position::new(0.0, 0.0), Position::new(13.0, 13.0))
            .unwrap();
        assert_path_clear(&grid, &path);
        // The straight diagonal (13 steps) is blocked; stepping around the
        // 2x2 block costs two extra steps.
        let steps = path.len() - 1;
        assert!((15..=16).contains(&steps), "unexpected step count {steps}");
    }

    #[test]
    fn goal_inside_footprint_fails() {
        let grid = grid_with(vec![make_building(10.0, 10.0).with_footprint(2, 2)], 50);
        let err = grid
            .find_path(Position::new(0.0, 0.0), Position::new(10.0, 10.0))
            .unwrap_err();
        assert!(matches!(err, WorldError::GoalBlocked { x: 10, y: 10 }));
    }

    #[test]
    fn out_of_bounds_endpoints_fail() {
        let grid = grid_with(Vec::new(), 10);
        let err = grid
            .find_path(Position::new(0.0, 0.0), Position::new(12.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { x: 12, y: 1 }));
        let err = grid
            .find_path(Position::new(-1.0, 0.0), Position::new(2.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, WorldError::OutOfBounds { x: -1, y: 0 }));
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let mut grid = grid_with(Vec::new(), 10);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx != 0 || dy != 0 {
                    let _ = grid.set_blocked(Cell::new(5 + dx, 5 + dy), true);
                }
            }
        }
        let err = grid
            .find_path(Position::new(0.0, 0.0), Position::new(5.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, WorldError::NoPath { .. }));
    }

    #[test]
    fn corner_cutting_allowed() {
        let mut grid = grid_with(Vec::new(), 3);
        let _ = grid.set_blocked(Cell::new(1, 0), true);
        let _ = grid.set_blocked(Cell::new(0, 1), true);
        let path = grid.find_cell_path(Cell::new(0, 0), Cell::new(1, 1)).unwrap();
        assert_eq!(path, vec![Cell::new(0, 0), Cell::new(1, 1)]);
    }

    #[test]
    fn start_equals_goal() {
        let grid = grid_with(Vec::new(), 5);
        let path = grid.find_cell_path(Cell::new(2, 2), Cell::new(2, 2)).unwrap();
        assert_eq!(path, vec![Cell::new(2, 2)]);
    }

    #[test]
    fn free_cell_is_adjacent_and_nearest() {
        let building = make_building(10.0, 10.0).with_footprint(2, 2);
        let grid = grid_with(vec![building.clone()], 30);
        let spot = grid
            .free_cell_near_building(&building, Position::new(0.0, 0.0))
            .unwrap();
        assert!(grid.is_walkable(spot));
        assert!(approx(spot.x, 9.0) && approx(spot.y, 9.0));

        let far_side = grid
            .free_cell_near_building(&building, Position::new(20.0, 20.0))
            .unwrap();
        assert!(approx(far_side.x, 12.0) && approx(far_side.y, 12.0));
    }

    #[test]
    fn blocked_building_is_reached_through_adjacent_cell() {
        let building = make_building(10.0, 10.0);
        let grid = grid_with(vec![building.clone()], 20);
        let start = Position::new(2.0, 2.0);
        assert!(!grid.is_walkable(building.position));
        assert!(grid.find_path(start, building.position).is_err());

        let door = grid.free_cell_near_building(&building, start).unwrap();
        assert_eq!(grid.to_cell(door).steps_to(grid.to_cell(building.position)), 1);
        let path = grid.find_path(start, door).unwrap();
        assert_path_clear(&grid, &path);
        assert_eq!(path.last().copied(), Some(door));
        // Seven diagonal steps from (2,2) to the door at (9,9).
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn free_cell_none_when_surrounded() {
        let building = make_building(5.0, 5.0);
        let mut grid = grid_with(vec![building.clone()], 10);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let _ = grid.set_blocked(Cell::new(5 + dx, 5 + dy), true);
            }
        }
        assert!(grid.free_cell_near_building(&building, Position::default()).is_none());
    }

    #[test]
    fn ascii_map_marks_agents() {
        let grid = grid_with(vec![make_building(1.0, 0.0)], 3);
        let map = grid.render_ascii(&[(Position::new(0.0, 0.0), 'A')]);
        assert_eq!(map, "A#.\n...\n...\n");
    }
}
