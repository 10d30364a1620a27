//! Tunable parameters for level generation, movement and collision.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Smallest grid edge that still leaves room for clearings and a path.
const MINIMUM_GRID_EDGE: u32 = 7;

/// Complete configuration surface of the game.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Seed of the run; `None` draws one from the operating system.
    pub seed: Option<u64>,
    /// Grid dimensions.
    pub grid: GridConfig,
    /// Maze carving and exit selection.
    pub maze: MazeConfig,
    /// Pond placement.
    pub ponds: PondConfig,
    /// Leaf decoration.
    pub leaves: LeafConfig,
    /// Player speed, hitbox and timings.
    pub player: PlayerConfig,
    /// Collision resolution.
    pub collision: CollisionConfig,
}

/// Grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of cell columns.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
    /// Edge length of a cell in world units.
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 25,
            rows: 25,
            cell_size: 16.0,
        }
    }
}

/// Maze carving, clearing, exit-selection and decoration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MazeConfig {
    /// Probability of an interior cell starting as a wall.
    pub interior_wall_probability: f64,
    /// Probability of opening the wall between two carved lattice cells.
    pub midpoint_open_probability: f64,
    /// Probability of opening one extra random neighbour of a carved cell.
    pub extra_opening_probability: f64,
    /// Fewest clearings attempted per level.
    pub min_clearings: u32,
    /// Most clearings attempted per level.
    pub max_clearings: u32,
    /// Placement attempts per clearing.
    pub clearing_attempts: u32,
    /// Probability of a 4x4 clearing instead of a 3x3 one.
    pub large_clearing_probability: f64,
    /// Multiplier applied to the longest grid edge when computing the path threshold.
    pub path_length_factor: f64,
    /// Additive term of the path threshold.
    pub min_additional_path_length: u32,
    /// Absolute floor of the path threshold.
    pub min_path_length: u32,
    /// Exit candidates sampled before falling back.
    pub exit_attempts: u32,
    /// Probability of a tree carrying apples.
    pub apple_tree_probability: f64,
    /// Probability of an interior floor cell holding a flower.
    pub flower_probability: f64,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            interior_wall_probability: 0.3,
            midpoint_open_probability: 0.7,
            extra_opening_probability: 0.3,
            min_clearings: 3,
            max_clearings: 6,
            clearing_attempts: 50,
            large_clearing_probability: 0.3,
            path_length_factor: 1.5,
            min_additional_path_length: 0,
            min_path_length: 15,
            exit_attempts: 200,
            apple_tree_probability: 0.15,
            flower_probability: 0.05,
        }
    }
}

/// Pond placement parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PondConfig {
    /// Probability of attempting a pond at an interior floor cell.
    pub spawn_probability: f64,
    /// Smallest pond radius in cells.
    pub min_radius: u32,
    /// Largest pond radius in cells.
    pub max_radius: u32,
    /// Probability of a neighbour tile joining the pond during growth.
    pub growth_probability: f64,
    /// Fewest water tiles a pond must contain.
    pub min_tiles: u32,
    /// Unscaled edge length of a water tile in world units.
    pub water_tile_size: f32,
    /// Scale applied to water tiles.
    pub water_tile_scale: f32,
    /// Cells along the grid edge that ponds never touch.
    pub margin: u32,
    /// Roll back ponds that would disconnect the entrance from the exit.
    pub verify_connectivity: bool,
}

impl PondConfig {
    /// Edge length of a scaled water tile in world units.
    #[must_use]
    pub fn scaled_tile(&self) -> f32 {
        self.water_tile_size * self.water_tile_scale
    }
}

impl Default for PondConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.10,
            min_radius: 2,
            max_radius: 4,
            growth_probability: 0.7,
            min_tiles: 4,
            water_tile_size: 8.0,
            water_tile_scale: 2.0,
            margin: 1,
            verify_connectivity: true,
        }
    }
}

/// Leaf decoration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeafConfig {
    /// Share of the grid that seeds leaf placement attempts.
    pub density: f64,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self { density: 0.05 }
    }
}

/// Player speed, hitbox and timing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Edge length of the player's square hitbox.
    pub hitbox_size: f32,
    /// Duration of a single walk animation frame in milliseconds.
    pub animation_frame_ms: u64,
    /// Number of walk animation frames.
    pub animation_frames: u32,
    /// Duration of a jump in milliseconds.
    pub jump_duration_ms: u64,
    /// Delay after landing before the next jump in milliseconds.
    pub jump_cooldown_ms: u64,
    /// How long an early jump press is remembered in milliseconds.
    pub jump_buffer_ms: u64,
    /// Delay between reaching an exit and the next level in milliseconds.
    pub transition_ms: u64,
}

impl PlayerConfig {
    /// Duration of a single walk animation frame.
    #[must_use]
    pub const fn animation_frame(&self) -> Duration {
        Duration::from_millis(self.animation_frame_ms)
    }

    /// Duration of a jump.
    #[must_use]
    pub const fn jump_duration(&self) -> Duration {
        Duration::from_millis(self.jump_duration_ms)
    }

    /// Delay after landing before the next jump.
    #[must_use]
    pub const fn jump_cooldown(&self) -> Duration {
        Duration::from_millis(self.jump_cooldown_ms)
    }

    /// How long an early jump press is remembered.
    #[must_use]
    pub const fn jump_buffer(&self) -> Duration {
        Duration::from_millis(self.jump_buffer_ms)
    }

    /// Delay between reaching an exit and the next level.
    #[must_use]
    pub const fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 120.0,
            hitbox_size: 12.0,
            animation_frame_ms: 200,
            animation_frames: 6,
            jump_duration_ms: 400,
            jump_cooldown_ms: 150,
            jump_buffer_ms: 200,
            transition_ms: 1000,
        }
    }
}

/// Strategy used to resolve player movement against obstacles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Move along X then Y, reverting an axis that collides.
    AxisSeparated,
    /// Push out along the axis of least penetration, sliding along walls.
    #[default]
    Sliding,
}

/// Collision resolution parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollisionConfig {
    /// Strategy used to resolve movement.
    pub mode: CollisionMode,
    /// Increments a frame's movement is split into in sliding mode.
    pub substeps: u32,
    /// Edge length of the square obstacle centered in wall and pond cells.
    pub tree_hitbox_size: f32,
    /// Extra reach of a border exit along the border normal.
    pub exit_tolerance: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            mode: CollisionMode::Sliding,
            substeps: 4,
            tree_hitbox_size: 16.0,
            exit_tolerance: 4.0,
        }
    }
}

/// Reasons a configuration is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The grid is too small to host a maze.
    #[error("grid {columns}x{rows} is smaller than the {minimum}x{minimum} minimum")]
    GridTooSmall {
        /// Requested columns.
        columns: u32,
        /// Requested rows.
        rows: u32,
        /// Smallest accepted edge.
        minimum: u32,
    },
    /// The required path cannot fit into the interior of the grid.
    #[error("required path length {required} exceeds the {interior} interior cells")]
    PathTooLong {
        /// Required entrance to exit path length.
        required: u32,
        /// Number of interior cells.
        interior: u32,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("{name} must lie in [0, 1], got {value}")]
    Probability {
        /// Configuration key.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A size, speed or count must be strictly positive.
    #[error("{name} must be positive")]
    NotPositive {
        /// Configuration key.
        name: &'static str,
    },
    /// A hitbox is larger than a cell.
    #[error("{name} of {size} exceeds the cell size {cell_size}")]
    HitboxTooLarge {
        /// Configuration key.
        name: &'static str,
        /// Offending size.
        size: f32,
        /// Configured cell size.
        cell_size: f32,
    },
    /// A lower bound exceeds its upper bound.
    #[error("{name} range {min}..={max} is empty")]
    EmptyRange {
        /// Configuration key.
        name: &'static str,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },
}

impl GameConfig {
    /// Minimum entrance to exit path length every level should honour.
    #[must_use]
    pub fn required_path_length(&self) -> u32 {
        let longest = self.grid.columns.max(self.grid.rows);
        let scaled = (f64::from(longest) * self.maze.path_length_factor).floor() as u32;
        self.maze
            .min_path_length
            .max(scaled.saturating_add(self.maze.min_additional_path_length))
    }

    /// Rejects configurations the generator and movement system cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let GridConfig {
            columns,
            rows,
            cell_size,
        } = self.grid;
        if columns < MINIMUM_GRID_EDGE || rows < MINIMUM_GRID_EDGE {
            return Err(ConfigError::GridTooSmall {
                columns,
                rows,
                minimum: MINIMUM_GRID_EDGE,
            });
        }

        let probabilities = [
            (
                "maze.interior_wall_probability",
                self.maze.interior_wall_probability,
            ),
            (
                "maze.midpoint_open_probability",
                self.maze.midpoint_open_probability,
            ),
            (
                "maze.extra_opening_probability",
                self.maze.extra_opening_probability,
            ),
            (
                "maze.large_clearing_probability",
                self.maze.large_clearing_probability,
            ),
            (
                "maze.apple_tree_probability",
                self.maze.apple_tree_probability,
            ),
            ("maze.flower_probability", self.maze.flower_probability),
            ("ponds.spawn_probability", self.ponds.spawn_probability),
            ("ponds.growth_probability", self.ponds.growth_probability),
            ("leaves.density", self.leaves.density),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }

        let positives = [
            ("grid.cell_size", cell_size),
            ("ponds.water_tile_size", self.ponds.water_tile_size),
            ("ponds.water_tile_scale", self.ponds.water_tile_scale),
            ("player.speed", self.player.speed),
            ("player.hitbox_size", self.player.hitbox_size),
            ("collision.tree_hitbox_size", self.collision.tree_hitbox_size),
        ];
        for (name, value) in positives {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name });
            }
        }
        if self.maze.path_length_factor < 0.0 {
            return Err(ConfigError::NotPositive {
                name: "maze.path_length_factor",
            });
        }
        if self.collision.exit_tolerance < 0.0 {
            return Err(ConfigError::NotPositive {
                name: "collision.exit_tolerance",
            });
        }

        let counts = [
            ("collision.substeps", self.collision.substeps),
            ("maze.exit_attempts", self.maze.exit_attempts),
            ("player.animation_frames", self.player.animation_frames),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::NotPositive { name });
            }
        }
        if self.player.animation_frame_ms == 0 {
            return Err(ConfigError::NotPositive {
                name: "player.animation_frame_ms",
            });
        }

        let hitboxes = [
            ("player.hitbox_size", self.player.hitbox_size),
            ("collision.tree_hitbox_size", self.collision.tree_hitbox_size),
        ];
        for (name, size) in hitboxes {
            if size > cell_size {
                return Err(ConfigError::HitboxTooLarge {
                    name,
                    size,
                    cell_size,
                });
            }
        }

        let ranges = [
            (
                "maze.clearings",
                self.maze.min_clearings,
                self.maze.max_clearings,
            ),
            (
                "ponds.radius",
                self.ponds.min_radius,
                self.ponds.max_radius,
            ),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(ConfigError::EmptyRange { name, min, max });
            }
        }

        let interior = (columns - 2).saturating_mul(rows - 2);
        let required = self.required_path_length();
        if required > interior {
            return Err(ConfigError::PathTooLong { required, interior });
        }

        Ok(())
    }
}
