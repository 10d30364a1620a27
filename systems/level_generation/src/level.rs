//! Orchestrates maze, pond, flower and leaf generation into a [`Level`].

use grove_maze_core::{
    CellCoord, CellState, ConfigError, GameConfig, GenerationReport, Level, LevelParts,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

use crate::{
    leaves::LeafGenerator, maze::MazeGenerator, navigation::floor_path_length,
    ponds::PondGenerator,
};

/// Reasons a level cannot be generated.
#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    /// The requested entrance is not a non-corner border cell.
    #[error("entrance {cell:?} is not a non-corner border cell of a {columns}x{rows} grid")]
    InvalidEntrance {
        /// Requested entrance.
        cell: CellCoord,
        /// Grid columns.
        columns: u32,
        /// Grid rows.
        rows: u32,
    },
    /// The configuration cannot produce levels.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Deterministic level factory: the same entrance and seed always yield the same level.
#[derive(Clone, Debug)]
pub struct LevelGenerator {
    columns: u32,
    rows: u32,
    maze: MazeGenerator,
    ponds: PondGenerator,
    leaves: LeafGenerator,
}

impl LevelGenerator {
    /// Validates the configuration and prepares the stage generators.
    pub fn new(config: &GameConfig) -> Result<Self, LevelError> {
        config.validate()?;
        let columns = config.grid.columns;
        let rows = config.grid.rows;
        let ponds = PondGenerator::new(config.grid.cell_size, config.ponds);
        Ok(Self {
            columns,
            rows,
            maze: MazeGenerator::new(columns, rows, config.maze, config.required_path_length()),
            leaves: LeafGenerator::new(config.leaves, ponds.geometry()),
            ponds,
        })
    }

    /// Minimum entrance to exit path length levels aim for.
    #[must_use]
    pub const fn required_path_length(&self) -> u32 {
        self.maze.required_path_length()
    }

    /// Generates a level whose entrance is `entrance`, or a random border cell when `None`.
    pub fn generate(&self, entrance: Option<CellCoord>, seed: u64) -> Result<Level, LevelError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        // Always drawn so a level replays from its seed and entrance alone.
        let drawn = self.maze.random_border_position(&mut rng);
        let entrance = match entrance {
            Some(cell) => self.validate_entrance(cell)?,
            None => drawn,
        };

        let layout = self.maze.generate(entrance, &mut rng);
        let mut grid = layout.grid;
        let exit = layout.exit;

        let placement = self
            .ponds
            .generate_ponds(&mut grid, Some((entrance, exit)), &mut rng);
        let flowers = self.maze.scatter_flowers(&grid, &mut rng);
        let leaves = self
            .leaves
            .generate_leaves(&grid, &placement.ponds, &mut rng);

        grid.reseal_border(entrance, exit);
        grid.set(entrance, CellState::Floor);
        grid.set(exit, CellState::Floor);

        let required = self.required_path_length();
        let path_length = floor_path_length(&grid, entrance, exit);
        let honoured = path_length.map_or(false, |length| length >= required);
        let report = GenerationReport {
            seed,
            required_path_length: required,
            path_length,
            exit_degraded: layout.degraded || !honoured,
            exit_attempts: layout.exit_attempts,
            fallback_corridor: layout.fallback_corridor,
            ponds_rejected_for_connectivity: placement.rejected_for_connectivity,
        };
        debug!(
            seed,
            ponds = placement.ponds.len(),
            flowers = flowers.len(),
            leaves = leaves.len(),
            ?path_length,
            "level generated"
        );

        Ok(Level::new(LevelParts {
            grid,
            tree_kinds: layout.tree_kinds,
            flowers,
            ponds: placement.ponds,
            leaves,
            clearings: layout.clearings,
            entrance,
            exit,
            report,
        }))
    }

    fn validate_entrance(&self, cell: CellCoord) -> Result<CellCoord, LevelError> {
        let last_column = self.columns - 1;
        let last_row = self.rows - 1;
        let on_vertical = cell.column() == 0 || cell.column() == last_column;
        let on_horizontal = cell.row() == 0 || cell.row() == last_row;
        let inside = cell.column() <= last_column && cell.row() <= last_row;
        if inside && (on_vertical != on_horizontal) {
            Ok(cell)
        } else {
            Err(LevelError::InvalidEntrance {
                cell,
                columns: self.columns,
                rows: self.rows,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(columns: u32, rows: u32) -> GameConfig {
        let mut config = GameConfig::default();
        config.grid.columns = columns;
        config.grid.rows = rows;
        config
    }

    #[test]
    fn same_seed_reproduces_level() {
        let generator = LevelGenerator::new(&config(21, 17)).expect("valid config");
        let first = generator.generate(None, 42).expect("level");
        let second = generator.generate(None, 42).expect("level");
        assert_eq!(first, second);

        let other = generator.generate(None, 43).expect("level");
        assert_ne!(first.grid(), other.grid());
    }

    #[test]
    fn seed_and_entrance_replay_a_random_entrance_level() {
        let generator = LevelGenerator::new(&config(25, 25)).expect("valid config");
        for seed in 0..8 {
            let random = generator.generate(None, seed).expect("level");
            let replayed = generator
                .generate(Some(random.entrance()), seed)
                .expect("level");
            assert_eq!(random, replayed, "seed {seed}");
        }
    }

    #[test]
    fn corner_entrance_is_rejected() {
        let generator = LevelGenerator::new(&config(19, 19)).expect("valid config");
        let result = generator.generate(Some(CellCoord::new(0, 0)), 1);
        assert_eq!(
            result,
            Err(LevelError::InvalidEntrance {
                cell: CellCoord::new(0, 0),
                columns: 19,
                rows: 19,
            })
        );
        assert!(generator.generate(Some(CellCoord::new(4, 4)), 1).is_err());
        assert!(generator.generate(Some(CellCoord::new(19, 4)), 1).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let error = LevelGenerator::new(&config(5, 19)).expect_err("grid too small");
        assert!(matches!(
            error,
            LevelError::Config(ConfigError::GridTooSmall { .. })
        ));
    }

    #[test]
    fn report_records_seed_and_requirement() {
        let generator = LevelGenerator::new(&config(19, 19)).expect("valid config");
        let level = generator
            .generate(Some(CellCoord::new(0, 5)), 7)
            .expect("level");
        assert_eq!(level.report().seed, 7);
        assert_eq!(level.report().required_path_length, 28);
        assert_eq!(level.entrance(), CellCoord::new(0, 5));
        if !level.report().meets_path_requirement() {
            assert!(level.report().exit_degraded);
        }
        assert!(level.report().exit_attempts >= 1);
    }
}
