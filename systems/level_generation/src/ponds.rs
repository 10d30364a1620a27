//! Organic pond growth and placement on floor cells.

use std::collections::VecDeque;

use grove_maze_core::{
    CellCoord, CellState, Direction, Grid, Pond, PondConfig, PondGeometry, PondMask, WorldPoint,
};
use rand::Rng;
use tracing::debug;

use crate::navigation::is_reachable;

const DIAGONALS: [(i64, i64); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Ponds committed to a grid together with placement diagnostics.
#[derive(Clone, Debug, Default)]
pub struct PondPlacement {
    /// Ponds whose cells were turned into water.
    pub ponds: Vec<Pond>,
    /// Ponds rolled back because they would have disconnected the protected cells.
    pub rejected_for_connectivity: u32,
}

/// Grows blob-shaped ponds over floor cells of a grid.
#[derive(Clone, Debug)]
pub struct PondGenerator {
    config: PondConfig,
    geometry: PondGeometry,
}

impl PondGenerator {
    /// Creates a generator for grids with the provided cell size.
    #[must_use]
    pub fn new(cell_size: f32, config: PondConfig) -> Self {
        Self {
            geometry: PondGeometry::new(cell_size, config.scaled_tile()),
            config,
        }
    }

    /// Mapping between pond tiles and grid cells used by this generator.
    #[must_use]
    pub const fn geometry(&self) -> PondGeometry {
        self.geometry
    }

    /// Scans interior floor cells and commits every pond that fits.
    ///
    /// When `protected` holds an entrance and exit and connectivity checks are
    /// enabled, a pond that would separate the two is rolled back.
    pub fn generate_ponds<R: Rng>(
        &self,
        grid: &mut Grid,
        protected: Option<(CellCoord, CellCoord)>,
        rng: &mut R,
    ) -> PondPlacement {
        let mut placement = PondPlacement::default();

        for row in 1..grid.rows().saturating_sub(1) {
            for column in 1..grid.columns().saturating_sub(1) {
                let cell = CellCoord::new(column, row);
                if !grid.is(cell, CellState::Floor) || !rng.gen_bool(self.config.spawn_probability)
                {
                    continue;
                }
                let radius = rng.gen_range(self.config.min_radius..=self.config.max_radius);
                let Some(pond) = self.grow_shape(cell, radius, rng) else {
                    continue;
                };
                if !self.can_place_pond(&pond, grid) {
                    continue;
                }

                let covered = self.commit(&pond, grid);
                if let Some((entrance, exit)) = protected.filter(|_| self.config.verify_connectivity)
                {
                    if !is_reachable(grid, entrance, exit) {
                        for cell in covered {
                            grid.set(cell, CellState::Floor);
                        }
                        placement.rejected_for_connectivity += 1;
                        continue;
                    }
                }
                placement.ponds.push(pond);
            }
        }

        debug!(
            placed = placement.ponds.len(),
            rejected = placement.rejected_for_connectivity,
            "ponds placed"
        );
        placement
    }

    /// Grows an organic mask centred on the provided cell.
    ///
    /// Returns `None` when the grown mask holds fewer than the configured minimum tiles.
    pub fn grow_shape<R: Rng>(&self, center: CellCoord, radius: u32, rng: &mut R) -> Option<Pond> {
        let side = self.geometry.mask_side(radius);
        if side == 0 {
            return None;
        }
        let mut shape = PondMask::empty(side);
        let middle = i64::from(side / 2);
        let reach = f64::from(side) / 2.0;
        shape.fill(middle, middle);

        let mut queue = VecDeque::from([(middle, middle)]);
        while let Some((x, y)) = queue.pop_front() {
            for direction in Direction::ALL {
                let (dx, dy) = direction.delta();
                let (nx, ny) = (x + i64::from(dx), y + i64::from(dy));
                if !shape.contains(nx, ny) || shape.is_water(nx, ny) {
                    continue;
                }
                let distance = (nx as f64 - reach).hypot(ny as f64 - reach);
                if distance <= reach && rng.gen_bool(self.config.growth_probability) {
                    shape.fill(nx, ny);
                    queue.push_back((nx, ny));
                }
            }
        }

        widen_single_tile_paths(&mut shape);
        form_l_shapes(&mut shape);

        let minimum = usize::try_from(self.config.min_tiles).unwrap_or(usize::MAX);
        if shape.water_count() < minimum {
            return None;
        }
        let cell_size = self.geometry.cell_size();
        Some(Pond::new(shape, WorldPoint::of_cell(center, cell_size)))
    }

    /// Reports whether every water tile lands on a floor cell inside the margin.
    #[must_use]
    pub fn can_place_pond(&self, pond: &Pond, grid: &Grid) -> bool {
        let margin = i64::from(self.config.margin);
        let columns = i64::from(grid.columns());
        let rows = i64::from(grid.rows());
        self.geometry.footprint(pond).all(|(column, row)| {
            column >= margin
                && column < columns - margin
                && row >= margin
                && row < rows - margin
                && grid.is(cell_at(column, row), CellState::Floor)
        })
    }

    /// Turns the pond's cells into water, returning the cells that changed.
    fn commit(&self, pond: &Pond, grid: &mut Grid) -> Vec<CellCoord> {
        let mut covered = Vec::new();
        for (column, row) in self.geometry.footprint(pond) {
            let cell = cell_at(column, row);
            if grid.is(cell, CellState::Floor) {
                grid.set(cell, CellState::Pond);
                covered.push(cell);
            }
        }
        covered
    }
}

fn cell_at(column: i64, row: i64) -> CellCoord {
    CellCoord::new(
        u32::try_from(column).unwrap_or(u32::MAX),
        u32::try_from(row).unwrap_or(u32::MAX),
    )
}

fn water_neighbors(shape: &PondMask, x: i64, y: i64) -> usize {
    Direction::ALL
        .into_iter()
        .filter(|direction| {
            let (dx, dy) = direction.delta();
            shape.is_water(x + i64::from(dx), y + i64::from(dy))
        })
        .count()
}

/// Gives every tile with a single water neighbour one more adjacent tile.
fn widen_single_tile_paths(shape: &mut PondMask) {
    let side = i64::from(shape.side());
    for y in 0..side {
        for x in 0..side {
            if !shape.is_water(x, y) || water_neighbors(shape, x, y) != 1 {
                continue;
            }
            let free = Direction::ALL.into_iter().find_map(|direction| {
                let (dx, dy) = direction.delta();
                let (nx, ny) = (x + i64::from(dx), y + i64::from(dy));
                (shape.contains(nx, ny) && !shape.is_water(nx, ny)).then_some((nx, ny))
            });
            if let Some((nx, ny)) = free {
                shape.fill(nx, ny);
            }
        }
    }
}

/// Rounds off remaining single-neighbour tips with a diagonal tile.
fn form_l_shapes(shape: &mut PondMask) {
    let side = i64::from(shape.side());
    for y in 0..side {
        for x in 0..side {
            if !shape.is_water(x, y) || water_neighbors(shape, x, y) != 1 {
                continue;
            }
            let free = DIAGONALS.into_iter().find_map(|(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                (shape.contains(nx, ny) && !shape.is_water(nx, ny)).then_some((nx, ny))
            });
            if let Some((nx, ny)) = free {
                shape.fill(nx, ny);
            }
        }
    }
}
