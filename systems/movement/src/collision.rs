//! Continuous player collision against cell-aligned obstacles.

use glam::Vec2;
use grove_maze_core::{CellCoord, CollisionConfig, CollisionMode, Direction, Grid};

/// Overlap below this many pixels counts as touching, not colliding.
const CONTACT_EPSILON: f32 = 1e-3;

/// Push-out passes per axis before giving up on a crowded corner.
const RESOLVE_PASSES: usize = 4;

/// Axis-aligned box in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Aabb {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Aabb {
    pub(crate) fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    pub(crate) fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Penetration depth along each axis, `None` when the boxes merely touch.
    fn overlap(&self, other: &Aabb) -> Option<Vec2> {
        let x = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let y = self.max.y.min(other.max.y) - self.min.y.max(other.min.y);
        (x > CONTACT_EPSILON && y > CONTACT_EPSILON).then(|| Vec2::new(x, y))
    }

    fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Resolves player boxes against the obstacles of one grid.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Collider<'a> {
    grid: &'a Grid,
    cell_size: f32,
    hitbox: f32,
    config: CollisionConfig,
}

impl<'a> Collider<'a> {
    pub(crate) fn new(
        grid: &'a Grid,
        cell_size: f32,
        hitbox: f32,
        config: CollisionConfig,
    ) -> Self {
        Self {
            grid,
            cell_size,
            hitbox,
            config,
        }
    }

    /// Hitbox of a player whose cell-sized box starts at `position`.
    pub(crate) fn hitbox_at(&self, position: Vec2) -> Aabb {
        let inset = (self.cell_size - self.hitbox) * 0.5;
        Aabb::from_min_size(position + Vec2::splat(inset), Vec2::splat(self.hitbox))
    }

    /// Moves the player box from `position` by `delta`, stopping at obstacles.
    pub(crate) fn advance(&self, position: Vec2, delta: Vec2) -> Vec2 {
        match self.config.mode {
            CollisionMode::AxisSeparated => self.advance_axis_separated(position, delta),
            CollisionMode::Sliding => self.advance_sliding(position, delta),
        }
    }

    /// Number of steps `delta` is split into, at least `minimum`.
    ///
    /// No step may exceed half the smaller hitbox, otherwise a long frame
    /// carries the player past an obstacle's center and out its far side.
    fn substeps_for(&self, delta: Vec2, minimum: u32) -> u32 {
        let max_step = self.hitbox.min(self.config.tree_hitbox_size) * 0.5;
        let needed = (delta.abs().max_element() / max_step).ceil();
        if needed.is_finite() {
            minimum.max(needed as u32).max(1)
        } else {
            minimum.max(1)
        }
    }

    fn advance_axis_separated(&self, position: Vec2, delta: Vec2) -> Vec2 {
        let substeps = self.substeps_for(delta, 1);
        let step = delta / substeps as f32;
        let mut resolved = position;
        for _ in 0..substeps {
            let moved_x = resolved + Vec2::new(step.x, 0.0);
            if !self.collides(&self.hitbox_at(moved_x)) {
                resolved = moved_x;
            }
            let moved_y = resolved + Vec2::new(0.0, step.y);
            if !self.collides(&self.hitbox_at(moved_y)) {
                resolved = moved_y;
            }
        }
        resolved
    }

    fn advance_sliding(&self, position: Vec2, delta: Vec2) -> Vec2 {
        let substeps = self.substeps_for(delta, self.config.substeps);
        let step = delta / substeps as f32;
        let mut resolved = position;
        for _ in 0..substeps {
            resolved.x += step.x;
            resolved = self.push_out(resolved, Axis::X);
            resolved.y += step.y;
            resolved = self.push_out(resolved, Axis::Y);
        }
        resolved
    }

    /// Pushes the box out of every obstacle it overlaps after moving along `moved`.
    ///
    /// Each obstacle is escaped along its axis of least penetration, which lets
    /// the player slide along walls and rounds off corners clipped by a few pixels.
    fn push_out(&self, position: Vec2, moved: Axis) -> Vec2 {
        let mut resolved = position;
        for _ in 0..RESOLVE_PASSES {
            let hitbox = self.hitbox_at(resolved);
            let Some((obstacle, depth)) = self
                .obstacles_near(&hitbox)
                .filter_map(|obstacle| hitbox.overlap(&obstacle).map(|depth| (obstacle, depth)))
                .max_by(|a, b| a.1.x.min(a.1.y).total_cmp(&b.1.x.min(b.1.y)))
            else {
                return resolved;
            };

            let toward = hitbox.center() - obstacle.center();
            let push_x = depth.x < depth.y || (depth.x == depth.y && moved == Axis::X);
            if push_x {
                resolved.x += depth.x.copysign(toward.x);
            } else {
                resolved.y += depth.y.copysign(toward.y);
            }
        }
        resolved
    }

    fn collides(&self, hitbox: &Aabb) -> bool {
        self.obstacles_near(hitbox)
            .any(|obstacle| hitbox.overlap(&obstacle).is_some())
    }

    /// Obstacle boxes of every blocked cell the hitbox could touch.
    ///
    /// Cells outside the grid are solid and occupy the whole cell.
    fn obstacles_near<'b>(&'b self, hitbox: &Aabb) -> impl Iterator<Item = Aabb> + 'b {
        let first_column = (hitbox.min.x / self.cell_size).floor() as i64 - 1;
        let last_column = (hitbox.max.x / self.cell_size).floor() as i64 + 1;
        let first_row = (hitbox.min.y / self.cell_size).floor() as i64 - 1;
        let last_row = (hitbox.max.y / self.cell_size).floor() as i64 + 1;
        (first_row..=last_row)
            .flat_map(move |row| (first_column..=last_column).map(move |column| (column, row)))
            .filter_map(move |(column, row)| self.obstacle(column, row))
    }

    fn obstacle(&self, column: i64, row: i64) -> Option<Aabb> {
        let origin = Vec2::new(column as f32, row as f32) * self.cell_size;
        let cell = cell_at(column, row).filter(|cell| self.grid.contains(*cell));
        match cell {
            None => Some(Aabb::from_min_size(origin, Vec2::splat(self.cell_size))),
            Some(cell) => {
                let passable = self
                    .grid
                    .get(cell)
                    .map_or(false, |state| state.is_passable());
                if passable {
                    return None;
                }
                let size = self.config.tree_hitbox_size;
                let inset = (self.cell_size - size) * 0.5;
                Some(Aabb::from_min_size(
                    origin + Vec2::splat(inset),
                    Vec2::splat(size),
                ))
            }
        }
    }

    /// Reports whether the hitbox center stands on `exit`.
    ///
    /// Border exits are widened by the configured tolerance along the border
    /// normal so the player does not have to hug the outer edge.
    pub(crate) fn reaches_exit(&self, position: Vec2, exit: CellCoord) -> bool {
        let center = self.hitbox_at(position).center();
        let origin = Vec2::new(exit.column() as f32, exit.row() as f32) * self.cell_size;
        let mut area = Aabb::from_min_size(origin, Vec2::splat(self.cell_size));
        let tolerance = self.config.exit_tolerance;
        match self.grid.inward_direction(exit) {
            Some(Direction::East | Direction::West) => {
                area.min.x -= tolerance;
                area.max.x += tolerance;
            }
            Some(Direction::North | Direction::South) => {
                area.min.y -= tolerance;
                area.max.y += tolerance;
            }
            None => {}
        }
        area.contains_point(center)
    }
}

fn cell_at(column: i64, row: i64) -> Option<CellCoord> {
    let column = u32::try_from(column).ok()?;
    let row = u32::try_from(row).ok()?;
    Some(CellCoord::new(column, row))
}
