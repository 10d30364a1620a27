//! Decorative leaf scattering in density tiers.

use grove_maze_core::{
    CellCoord, CellState, Direction, Grid, Leaf, LeafConfig, LeafPattern, Pond, PondGeometry,
};
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

const PRIMARY_SHARE: f64 = 0.7;
const X_PATTERN_SHARE: f64 = 0.3;
const CLUSTER_SIZES: [(u32, u32); 4] = [(1, 1), (2, 1), (1, 2), (2, 2)];
const TRANSITION_DENSITY: f32 = 0.3;
const NEIGHBOURHOOD_RADIUS: i32 = 2;
const NEIGHBOURHOOD_CELLS: f32 = 25.0;

/// Scatters leaves over floor cells without touching the grid.
#[derive(Clone, Debug)]
pub struct LeafGenerator {
    config: LeafConfig,
    geometry: PondGeometry,
}

impl LeafGenerator {
    /// Creates a generator that keeps leaves off ponds laid out with `geometry`.
    #[must_use]
    pub fn new(config: LeafConfig, geometry: PondGeometry) -> Self {
        Self { config, geometry }
    }

    /// Generates at most one leaf per cell, sorted in row-major order.
    pub fn generate_leaves<R: Rng>(&self, grid: &Grid, ponds: &[Pond], rng: &mut R) -> Vec<Leaf> {
        let mut canvas = Canvas::new(grid, ponds, self.geometry);
        let area = f64::from(grid.columns()) * f64::from(grid.rows());

        let primary_tries = (area * self.config.density * PRIMARY_SHARE).floor() as u32;
        for _ in 0..primary_tries {
            canvas.try_primary_cluster(rng);
        }
        canvas.frame_primary_clusters();

        let x_tries = (area * self.config.density * X_PATTERN_SHARE).floor() as u32;
        for _ in 0..x_tries {
            canvas.try_x_block(rng);
        }
        canvas.fill_transitions(rng);

        let leaves = canvas.into_leaves();
        debug!(count = leaves.len(), "leaves scattered");
        leaves
    }
}

/// Working state for a single leaf pass.
struct Canvas<'a> {
    grid: &'a Grid,
    ponds: &'a [Pond],
    geometry: PondGeometry,
    patterns: Vec<Option<LeafPattern>>,
    density: Vec<f32>,
}

impl<'a> Canvas<'a> {
    fn new(grid: &'a Grid, ponds: &'a [Pond], geometry: PondGeometry) -> Self {
        let count = grid.cells().len();
        Self {
            grid,
            ponds,
            geometry,
            patterns: vec![None; count],
            density: vec![0.0; count],
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.grid.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.grid.columns()).ok()?;
        Some(row * width + column)
    }

    fn pattern(&self, cell: CellCoord) -> Option<LeafPattern> {
        self.index(cell)
            .and_then(|index| self.patterns.get(index).copied().flatten())
    }

    fn paint(&mut self, cell: CellCoord, pattern: LeafPattern, density: Option<f32>) {
        let Some(index) = self.index(cell) else {
            return;
        };
        if let Some(slot) = self.patterns.get_mut(index) {
            *slot = Some(pattern);
        }
        if let (Some(value), Some(slot)) = (density, self.density.get_mut(index)) {
            *slot = value;
        }
    }

    fn in_pond(&self, cell: CellCoord) -> bool {
        self.ponds
            .iter()
            .any(|pond| self.geometry.bounds_contain(pond, cell))
    }

    /// Interior floor cell with no wall beside it and away from every pond.
    fn is_empty_cell(&self, cell: CellCoord) -> bool {
        if !self.grid.is_interior(cell) || !self.grid.is(cell, CellState::Floor) {
            return false;
        }
        let walled = Direction::ALL.into_iter().any(|direction| {
            cell.step(direction)
                .and_then(|neighbor| self.grid.get(neighbor))
                .map_or(true, |state| state == CellState::Wall)
        });
        !walled && !self.in_pond(cell)
    }

    fn is_free(&self, cell: CellCoord) -> bool {
        self.is_empty_cell(cell) && self.pattern(cell).is_none()
    }

    fn try_primary_cluster<R: Rng>(&mut self, rng: &mut R) {
        let origin = CellCoord::new(
            rng.gen_range(0..self.grid.columns()),
            rng.gen_range(0..self.grid.rows()),
        );
        if !self.is_empty_cell(origin) {
            return;
        }
        let Some(&(width, height)) = CLUSTER_SIZES.choose(rng) else {
            return;
        };
        let cells: Vec<_> = (0..height)
            .flat_map(|dy| (0..width).map(move |dx| (dx, dy)))
            .map(|(dx, dy)| CellCoord::new(origin.column() + dx, origin.row() + dy))
            .collect();
        if !cells.iter().all(|cell| self.is_empty_cell(*cell)) {
            return;
        }
        for cell in cells {
            if let Some(pattern) = LeafPattern::PRIMARY.choose(rng) {
                self.paint(cell, *pattern, Some(1.0));
            }
        }
    }

    /// Frames every primary cell with edge patterns on its non-primary neighbours.
    fn frame_primary_clusters(&mut self) {
        let primaries: Vec<_> = self
            .grid
            .iter()
            .map(|(cell, _)| cell)
            .filter(|cell| self.pattern(*cell).map_or(false, LeafPattern::is_primary))
            .collect();

        for cell in primaries {
            for direction in Direction::ALL {
                let Some(neighbor) = cell.step(direction) else {
                    continue;
                };
                let eligible = self.grid.is_interior(neighbor)
                    && self.grid.is(neighbor, CellState::Floor)
                    && !self.in_pond(neighbor)
                    && !self.pattern(neighbor).map_or(false, LeafPattern::is_primary);
                if eligible {
                    self.paint(neighbor, LeafPattern::border_facing(direction), None);
                }
            }
        }
    }

    fn try_x_block<R: Rng>(&mut self, rng: &mut R) {
        let columns = self.grid.columns().saturating_sub(1);
        let rows = self.grid.rows().saturating_sub(1);
        if columns == 0 || rows == 0 {
            return;
        }
        let origin = CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        let block: Vec<_> = (0..2u32)
            .flat_map(|dy| (0..2u32).map(move |dx| (dx, dy)))
            .map(|(dx, dy)| CellCoord::new(origin.column() + dx, origin.row() + dy))
            .collect();
        if !block.iter().all(|cell| self.is_free(*cell)) {
            return;
        }
        for (cell, pattern) in block.into_iter().zip(LeafPattern::X_BLOCK) {
            self.paint(cell, pattern, Some(1.0));
        }
    }

    fn neighbourhood_density(&self, cell: CellCoord) -> f32 {
        let mut total = 0.0;
        for dy in -NEIGHBOURHOOD_RADIUS..=NEIGHBOURHOOD_RADIUS {
            for dx in -NEIGHBOURHOOD_RADIUS..=NEIGHBOURHOOD_RADIUS {
                let value = cell
                    .offset(dx, dy)
                    .and_then(|neighbor| self.index(neighbor))
                    .and_then(|index| self.density.get(index).copied());
                total += value.unwrap_or(0.0);
            }
        }
        total / NEIGHBOURHOOD_CELLS
    }

    fn fill_transitions<R: Rng>(&mut self, rng: &mut R) {
        for row in 0..self.grid.rows() {
            for column in 0..self.grid.columns() {
                let cell = CellCoord::new(column, row);
                if !self.is_free(cell) {
                    continue;
                }
                let density = self.neighbourhood_density(cell);
                if let Some(pattern) = transition_pattern(density, rng) {
                    self.paint(cell, pattern, Some(TRANSITION_DENSITY));
                }
            }
        }
    }

    fn into_leaves(self) -> Vec<Leaf> {
        let columns = self.grid.columns().max(1);
        self.patterns
            .into_iter()
            .enumerate()
            .filter_map(|(index, pattern)| {
                let index = u32::try_from(index).ok()?;
                pattern.map(|pattern| Leaf {
                    cell: CellCoord::new(index % columns, index / columns),
                    pattern,
                })
            })
            .collect()
    }
}

/// Picks the transition leaf for a neighbourhood with the provided average density.
fn transition_pattern<R: Rng>(density: f32, rng: &mut R) -> Option<LeafPattern> {
    if density > 0.4 {
        Some(LeafPattern::A)
    } else if density > 0.2 {
        Some(if rng.gen_bool(0.5) {
            LeafPattern::TwoLeaves1
        } else {
            LeafPattern::TwoLeaves2
        })
    } else if density > 0.05 && rng.gen_bool(0.3) {
        LeafPattern::SINGLE.choose(rng).copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use grove_maze_core::{PondMask, WorldPoint};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn open_grid(columns: u32, rows: u32) -> Grid {
        let mut grid = Grid::filled(columns, rows, CellState::Floor);
        let border: Vec<_> = grid
            .iter()
            .map(|(cell, _)| cell)
            .filter(|cell| grid.is_border(*cell))
            .collect();
        for cell in border {
            grid.set(cell, CellState::Wall);
        }
        grid
    }

    fn generator(density: f64) -> LeafGenerator {
        LeafGenerator::new(LeafConfig { density }, PondGeometry::new(16.0, 16.0))
    }

    #[test]
    fn leaves_are_unique_sorted_and_on_floor() {
        let grid = open_grid(20, 16);
        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let leaves = generator(0.2).generate_leaves(&grid, &[], &mut rng);

            let cells: Vec<_> = leaves
                .iter()
                .map(|leaf| (leaf.cell.row(), leaf.cell.column()))
                .collect();
            let mut sorted = cells.clone();
            sorted.sort_unstable();
            assert_eq!(cells, sorted);
            assert_eq!(cells.iter().collect::<HashSet<_>>().len(), cells.len());

            for leaf in &leaves {
                assert!(grid.is(leaf.cell, CellState::Floor));
                assert!(grid.is_interior(leaf.cell));
            }
        }
    }

    #[test]
    fn primary_cells_are_framed_by_border_patterns() {
        let grid = open_grid(20, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let leaves = generator(0.2).generate_leaves(&grid, &[], &mut rng);
        let lookup: std::collections::HashMap<_, _> =
            leaves.iter().map(|leaf| (leaf.cell, leaf.pattern)).collect();

        let primaries: Vec<_> = leaves
            .iter()
            .filter(|leaf| leaf.pattern.is_primary())
            .collect();
        assert!(!primaries.is_empty());
        for leaf in primaries {
            for direction in Direction::ALL {
                let Some(neighbor) = leaf.cell.step(direction) else {
                    continue;
                };
                if !grid.is_interior(neighbor) {
                    continue;
                }
                let pattern = lookup.get(&neighbor).copied();
                assert!(
                    pattern.map_or(false, |p| p.is_primary()
                        || matches!(
                            p,
                            LeafPattern::ERight
                                | LeafPattern::ELeft
                                | LeafPattern::ETop
                                | LeafPattern::EBottom
                        )),
                    "{neighbor:?} next to primary {:?} holds {pattern:?}",
                    leaf.cell
                );
            }
        }
    }

    #[test]
    fn leaves_stay_clear_of_ponds() {
        let mut grid = open_grid(16, 16);
        let mut mask = PondMask::empty(4);
        for y in 0..4 {
            for x in 0..4 {
                mask.fill(x, y);
            }
        }
        let pond = Pond::new(mask, WorldPoint::of_cell(CellCoord::new(8, 8), 16.0));
        let geometry = PondGeometry::new(16.0, 16.0);
        for (column, row) in geometry.footprint(&pond).collect::<Vec<_>>() {
            grid.set(CellCoord::new(column as u32, row as u32), CellState::Pond);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let leaves = generator(0.3).generate_leaves(&grid, std::slice::from_ref(&pond), &mut rng);
        for leaf in leaves {
            assert!(!geometry.bounds_contain(&pond, leaf.cell), "{:?}", leaf.cell);
        }
    }

    #[test]
    fn walled_grid_has_no_leaves() {
        let grid = Grid::filled(12, 12, CellState::Wall);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(generator(0.5).generate_leaves(&grid, &[], &mut rng).is_empty());
    }

    #[test]
    fn transition_thresholds() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(transition_pattern(0.5, &mut rng), Some(LeafPattern::A));
        assert!(matches!(
            transition_pattern(0.3, &mut rng),
            Some(LeafPattern::TwoLeaves1 | LeafPattern::TwoLeaves2)
        ));
        assert_eq!(transition_pattern(0.01, &mut rng), None);
        for _ in 0..32 {
            if let Some(pattern) = transition_pattern(0.1, &mut rng) {
                assert!(LeafPattern::SINGLE.contains(&pattern));
            }
        }
    }
}
