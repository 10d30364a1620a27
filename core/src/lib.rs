#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grove Maze engine.
//!
//! This crate defines the data model of a generated level and the message
//! surface that connects adapters, the authoritative world, and pure systems.
//! Adapters submit [`Command`] values describing desired mutations, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values for systems to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    CollisionConfig, CollisionMode, ConfigError, GameConfig, GridConfig, LeafConfig, MazeConfig,
    PlayerConfig, PondConfig,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Grove Maze.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Resets the level counter and requests the first level.
    StartGame,
    /// Installs a freshly generated level and places the player at its entrance.
    InstallLevel {
        /// Level produced by the generation system.
        level: Box<Level>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the player to a collision-resolved position.
    MovePlayer {
        /// Resolved top-left corner of the player's cell-sized box in world units.
        position: WorldPoint,
        /// Direction the player faces after the move.
        facing: Direction,
        /// Animation state that should be presented for the player.
        animation: AnimationState,
    },
    /// Reports that the player stands on the exit of the active level.
    ReachExit,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Asks the level generation system for a new level.
    LevelRequested {
        /// One-based number of the requested level.
        number: u32,
        /// Entrance the level must use, or `None` to pick a random border cell.
        entrance: Option<CellCoord>,
    },
    /// Confirms that a generated level became active.
    LevelInstalled {
        /// One-based number of the installed level.
        number: u32,
        /// Entrance cell on the border of the level.
        entrance: CellCoord,
        /// Exit cell on the border of the level.
        exit: CellCoord,
    },
    /// Reports that the installed level could not honour the path-length threshold.
    LevelDegraded {
        /// One-based number of the degraded level.
        number: u32,
        /// Minimum path length the generator attempted to guarantee.
        required: u32,
        /// Shortest entrance to exit path measured on the final grid.
        actual: Option<u32>,
    },
    /// Confirms that the player moved.
    PlayerMoved {
        /// Position before the move.
        from: WorldPoint,
        /// Position after the move.
        to: WorldPoint,
    },
    /// Announces that the player reached the exit and the transition started.
    ExitReached {
        /// Number of the level that was completed.
        number: u32,
    },
}

/// Cardinal directions used for grid traversal and player facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All cardinal directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// Animation state presented for the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    /// Standing still.
    #[default]
    Idle,
    /// Walking in the facing direction.
    Walk,
    /// Mid-jump.
    Jump,
}

impl AnimationState {
    /// Every animation state.
    pub const ALL: [AnimationState; 3] = [
        AnimationState::Idle,
        AnimationState::Walk,
        AnimationState::Jump,
    ];
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Offsets the coordinate, returning `None` when either axis would become negative.
    #[must_use]
    pub fn offset(self, delta_column: i32, delta_row: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(delta_column)?;
        let row = self.row.checked_add_signed(delta_row)?;
        Some(CellCoord::new(column, row))
    }

    /// Neighbouring coordinate one step in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (delta_column, delta_row) = direction.delta();
        self.offset(delta_column, delta_row)
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = cell.column();
        let row = cell.row();
        column >= self.origin.column()
            && row >= self.origin.row()
            && column - self.origin.column() < self.size.width()
            && row - self.origin.row() < self.size.height()
    }

    /// Iterates every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Continuous position expressed in world units (pixels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate growing to the east.
    pub x: f32,
    /// Vertical coordinate growing to the south.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Top-left corner of the provided cell for the given cell size.
    #[must_use]
    pub fn of_cell(cell: CellCoord, cell_size: f32) -> Self {
        Self::new(
            cell.column() as f32 * cell_size,
            cell.row() as f32 * cell_size,
        )
    }
}

/// Passability state of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Impassable cell rendered as a tree.
    Wall,
    /// Passable ground.
    Floor,
    /// Impassable water, equivalent to a wall for collision.
    Pond,
}

impl CellState {
    /// Reports whether the player may walk through the cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Floor)
    }
}

/// Dense row-major matrix of cell states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates a grid with every cell set to the provided state.
    #[must_use]
    pub fn filled(columns: u32, rows: u32, state: CellState) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![state; capacity],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Dense cell states stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// State of the provided cell, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Overwrites the state of the provided cell. Cells outside the grid are ignored.
    pub fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = state;
            }
        }
    }

    /// Reports whether the cell holds the provided state.
    #[must_use]
    pub fn is(&self, cell: CellCoord, state: CellState) -> bool {
        self.get(cell) == Some(state)
    }

    /// Reports whether the cell lies on the outer ring of the grid.
    #[must_use]
    pub const fn is_border(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.columns
                || cell.row() + 1 == self.rows)
    }

    /// Reports whether the cell lies inside the grid but off the border.
    #[must_use]
    pub const fn is_interior(&self, cell: CellCoord) -> bool {
        self.contains(cell) && !self.is_border(cell)
    }

    /// Reports whether the cell is a border cell other than one of the four corners.
    #[must_use]
    pub const fn is_border_edge(&self, cell: CellCoord) -> bool {
        if !self.is_border(cell) {
            return false;
        }
        let on_vertical = cell.column() == 0 || cell.column() + 1 == self.columns;
        let on_horizontal = cell.row() == 0 || cell.row() + 1 == self.rows;
        !(on_vertical && on_horizontal)
    }

    /// Direction pointing from a border edge cell into the interior.
    #[must_use]
    pub fn inward_direction(&self, cell: CellCoord) -> Option<Direction> {
        if !self.is_border_edge(cell) {
            return None;
        }
        if cell.column() == 0 {
            Some(Direction::East)
        } else if cell.column() + 1 == self.columns {
            Some(Direction::West)
        } else if cell.row() == 0 {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }

    /// Interior neighbour of a border edge cell.
    #[must_use]
    pub fn inward_neighbor(&self, cell: CellCoord) -> Option<CellCoord> {
        self.inward_direction(cell)
            .and_then(|direction| cell.step(direction))
    }

    /// Cell mirrored across the grid: border columns and rows swap sides.
    ///
    /// Used to place the entrance of a level opposite the previous exit.
    #[must_use]
    pub fn mirrored(&self, cell: CellCoord) -> CellCoord {
        let last_column = self.columns.saturating_sub(1);
        let last_row = self.rows.saturating_sub(1);
        let column = if cell.column() == 0 {
            last_column
        } else if cell.column() == last_column {
            0
        } else {
            cell.column()
        };
        let row = if cell.row() == 0 {
            last_row
        } else if cell.row() == last_row {
            0
        } else {
            cell.row()
        };
        CellCoord::new(column, row)
    }

    /// In-bounds 4-connected neighbours in north, east, south, west order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        let rows = self.rows;
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| cell.step(direction))
            .filter(move |neighbor| neighbor.column() < columns && neighbor.row() < rows)
    }

    /// Counts the 4-connected neighbours holding the provided state.
    #[must_use]
    pub fn count_neighbors(&self, cell: CellCoord, state: CellState) -> usize {
        self.neighbors(cell)
            .filter(|neighbor| self.is(*neighbor, state))
            .count()
    }

    /// Iterates every cell coordinate together with its state in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, state)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *state)
        })
    }

    /// Turns every open border cell other than the provided openings back into a wall.
    ///
    /// Applying the reseal more than once yields the same grid.
    pub fn reseal_border(&mut self, entrance: CellCoord, exit: CellCoord) {
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                if !self.is_border(cell) || cell == entrance || cell == exit {
                    continue;
                }
                if !self.is(cell, CellState::Wall) {
                    self.set(cell, CellState::Wall);
                }
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Decorative variety applied to a wall cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeKind {
    /// Plain tree.
    #[default]
    Normal,
    /// Tree carrying apples.
    Apple,
}

/// Tree variety chosen for every cell when the maze is initialised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeKinds {
    columns: u32,
    kinds: Vec<TreeKind>,
}

impl TreeKinds {
    /// Creates a tree map from row-major kinds.
    #[must_use]
    pub fn from_row_major(columns: u32, kinds: Vec<TreeKind>) -> Self {
        Self { columns, kinds }
    }

    /// Tree kind recorded for the cell, defaulting to [`TreeKind::Normal`].
    #[must_use]
    pub fn kind(&self, cell: CellCoord) -> TreeKind {
        if cell.column() >= self.columns {
            return TreeKind::Normal;
        }
        let index = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.kinds.get(index).copied().unwrap_or_default()
    }

    /// Dense kinds stored in row-major order.
    #[must_use]
    pub fn kinds(&self) -> &[TreeKind] {
        &self.kinds
    }
}

/// Flower varieties scattered over the floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowerKind {
    /// White flower.
    White,
    /// Mauve flower.
    Mauve,
    /// Red flower.
    Red,
}

impl FlowerKind {
    /// Every flower variety.
    pub const ALL: [FlowerKind; 3] = [FlowerKind::White, FlowerKind::Mauve, FlowerKind::Red];
}

/// Flower placed on an interior floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Flower {
    /// Cell holding the flower.
    pub cell: CellCoord,
    /// Variety of the flower.
    pub kind: FlowerKind,
}

/// Square occupancy mask describing the organic outline of a pond.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PondMask {
    side: u32,
    tiles: Vec<bool>,
}

impl PondMask {
    /// Creates an empty mask of the provided side length in water tiles.
    #[must_use]
    pub fn empty(side: u32) -> Self {
        let capacity = usize::try_from(u64::from(side) * u64::from(side)).unwrap_or(0);
        Self {
            side,
            tiles: vec![false; capacity],
        }
    }

    /// Side length of the mask in water tiles.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Reports whether the tile holds water. Out-of-range tiles are dry.
    #[must_use]
    pub fn is_water(&self, x: i64, y: i64) -> bool {
        self.index(x, y)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(false)
    }

    /// Marks the tile as water. Out-of-range tiles are ignored.
    pub fn fill(&mut self, x: i64, y: i64) {
        if let Some(index) = self.index(x, y) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = true;
            }
        }
    }

    /// Reports whether the tile lies inside the mask.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        let side = i64::from(self.side);
        x >= 0 && y >= 0 && x < side && y < side
    }

    /// Number of water tiles.
    #[must_use]
    pub fn water_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile).count()
    }

    /// Iterates the mask coordinates of every water tile in row-major order.
    pub fn water_tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let side = self.side.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile)
            .map(move |(index, _)| {
                let index = index as u32;
                (index % side, index / side)
            })
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        usize::try_from(y * i64::from(self.side) + x).ok()
    }
}

/// Conversion between pond mask tiles, world units and grid cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PondGeometry {
    cell_size: f32,
    scaled_tile: f32,
}

impl PondGeometry {
    /// Creates a geometry for the provided cell size and scaled water tile size.
    #[must_use]
    pub const fn new(cell_size: f32, scaled_tile: f32) -> Self {
        Self {
            cell_size,
            scaled_tile,
        }
    }

    /// Size of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Size of a single water tile in world units.
    #[must_use]
    pub const fn scaled_tile(&self) -> f32 {
        self.scaled_tile
    }

    /// Side of a pond mask, in water tiles, grown with the provided radius in cells.
    #[must_use]
    pub fn mask_side(&self, radius: u32) -> u32 {
        if self.scaled_tile <= 0.0 {
            return 0;
        }
        (radius as f32 * 2.0 * self.cell_size / self.scaled_tile).floor() as u32
    }

    /// World-space top-left corner of the mask tile.
    #[must_use]
    pub fn tile_origin(&self, pond: &Pond, x: u32, y: u32) -> WorldPoint {
        let half = (pond.shape().side() / 2) as f32 * self.scaled_tile;
        WorldPoint::new(
            pond.center().x - half + x as f32 * self.scaled_tile,
            pond.center().y - half + y as f32 * self.scaled_tile,
        )
    }

    /// Signed grid column and row covered by the mask tile.
    #[must_use]
    pub fn tile_cell(&self, pond: &Pond, x: u32, y: u32) -> (i64, i64) {
        let origin = self.tile_origin(pond, x, y);
        (
            (origin.x / self.cell_size).floor() as i64,
            (origin.y / self.cell_size).floor() as i64,
        )
    }

    /// Signed grid cells covered by the pond's water tiles, possibly repeated.
    pub fn footprint<'a>(&'a self, pond: &'a Pond) -> impl Iterator<Item = (i64, i64)> + 'a {
        pond.shape()
            .water_tiles()
            .map(move |(x, y)| self.tile_cell(pond, x, y))
    }

    /// Reports whether any water tile of the pond lands on the cell.
    #[must_use]
    pub fn covers(&self, pond: &Pond, cell: CellCoord) -> bool {
        let target = (i64::from(cell.column()), i64::from(cell.row()));
        self.footprint(pond).any(|covered| covered == target)
    }

    /// Reports whether the top-left corner of the cell lies inside the pond's square bounds.
    #[must_use]
    pub fn bounds_contain(&self, pond: &Pond, cell: CellCoord) -> bool {
        let origin = self.tile_origin(pond, 0, 0);
        let extent = pond.shape().side() as f32 * self.scaled_tile;
        let corner = WorldPoint::of_cell(cell, self.cell_size);
        corner.x >= origin.x
            && corner.x < origin.x + extent
            && corner.y >= origin.y
            && corner.y < origin.y + extent
    }
}

/// Organic water feature placed on the floor.
#[derive(Clone, Debug, PartialEq)]
pub struct Pond {
    shape: PondMask,
    center: WorldPoint,
}

impl Pond {
    /// Creates a pond from its mask and world-space center.
    #[must_use]
    pub fn new(shape: PondMask, center: WorldPoint) -> Self {
        Self { shape, center }
    }

    /// Occupancy mask describing the pond outline.
    #[must_use]
    pub const fn shape(&self) -> &PondMask {
        &self.shape
    }

    /// World-space center of the pond.
    #[must_use]
    pub const fn center(&self) -> WorldPoint {
        self.center
    }
}

/// Decorative leaf pattern painted over a floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeafPattern {
    /// Dense transition cover.
    A,
    /// Primary cluster variant B.
    B,
    /// Primary cluster variant C.
    C,
    /// Primary cluster variant D.
    D,
    /// Primary cluster centre piece.
    ECenter,
    /// Cluster edge facing east.
    ERight,
    /// Cluster edge facing west.
    ELeft,
    /// Cluster edge facing north.
    ETop,
    /// Cluster edge facing south.
    EBottom,
    /// Upper-left quarter of an X block.
    XTopLeft,
    /// Upper-right quarter of an X block.
    XTopRight,
    /// Lower-left quarter of an X block.
    XBottomLeft,
    /// Lower-right quarter of an X block.
    XBottomRight,
    /// Pair of leaves, first variant.
    TwoLeaves1,
    /// Pair of leaves, second variant.
    TwoLeaves2,
    /// Single leaf in the upper-left corner.
    SingleTopLeft,
    /// Single leaf in the upper-right corner.
    SingleTopRight,
    /// Single leaf in the lower-left corner.
    SingleBottomLeft,
    /// Single leaf in the lower-right corner.
    SingleBottomRight,
}

impl LeafPattern {
    /// Patterns used for the body of primary clusters.
    pub const PRIMARY: [LeafPattern; 4] = [
        LeafPattern::B,
        LeafPattern::C,
        LeafPattern::D,
        LeafPattern::ECenter,
    ];

    /// Corner patterns of an X block, indexed `row * 2 + column`.
    pub const X_BLOCK: [LeafPattern; 4] = [
        LeafPattern::XTopLeft,
        LeafPattern::XTopRight,
        LeafPattern::XBottomLeft,
        LeafPattern::XBottomRight,
    ];

    /// Single-leaf accents used in sparse neighbourhoods.
    pub const SINGLE: [LeafPattern; 4] = [
        LeafPattern::SingleBottomLeft,
        LeafPattern::SingleBottomRight,
        LeafPattern::SingleTopLeft,
        LeafPattern::SingleTopRight,
    ];

    /// Every leaf pattern, in declaration order.
    pub const ALL: [LeafPattern; 19] = [
        LeafPattern::A,
        LeafPattern::B,
        LeafPattern::C,
        LeafPattern::D,
        LeafPattern::ECenter,
        LeafPattern::ERight,
        LeafPattern::ELeft,
        LeafPattern::ETop,
        LeafPattern::EBottom,
        LeafPattern::XTopLeft,
        LeafPattern::XTopRight,
        LeafPattern::XBottomLeft,
        LeafPattern::XBottomRight,
        LeafPattern::TwoLeaves1,
        LeafPattern::TwoLeaves2,
        LeafPattern::SingleTopLeft,
        LeafPattern::SingleTopRight,
        LeafPattern::SingleBottomLeft,
        LeafPattern::SingleBottomRight,
    ];

    /// Reports whether the pattern belongs to a primary cluster body.
    #[must_use]
    pub fn is_primary(self) -> bool {
        Self::PRIMARY.contains(&self)
    }

    /// Edge pattern framing a primary cluster on the side facing `direction`.
    #[must_use]
    pub const fn border_facing(direction: Direction) -> Self {
        match direction {
            Direction::North => Self::ETop,
            Direction::East => Self::ERight,
            Direction::South => Self::EBottom,
            Direction::West => Self::ELeft,
        }
    }
}

/// Leaf overlay placed on a floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Leaf {
    /// Cell covered by the leaf.
    pub cell: CellCoord,
    /// Pattern painted on the cell.
    pub pattern: LeafPattern,
}

/// Diagnostics captured while generating a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationReport {
    /// Seed that reproduces the level.
    pub seed: u64,
    /// Minimum entrance to exit path length the generator aimed for.
    pub required_path_length: u32,
    /// Shortest entrance to exit path measured on the final grid.
    pub path_length: Option<u32>,
    /// Whether exit selection exhausted its budget and accepted a shorter path.
    pub exit_degraded: bool,
    /// Number of exit candidates sampled.
    pub exit_attempts: u32,
    /// Whether a fallback corridor had to be carved to reach the exit.
    pub fallback_corridor: bool,
    /// Ponds rolled back because they would have disconnected the exit.
    pub ponds_rejected_for_connectivity: u32,
}

impl GenerationReport {
    /// Reports whether the final path honours the configured minimum length.
    #[must_use]
    pub fn meets_path_requirement(&self) -> bool {
        self.path_length
            .map_or(false, |length| length >= self.required_path_length)
    }
}

/// Building blocks of a [`Level`].
#[derive(Clone, Debug, PartialEq)]
pub struct LevelParts {
    /// Final cell states.
    pub grid: Grid,
    /// Tree variety for every cell.
    pub tree_kinds: TreeKinds,
    /// Flowers scattered over the floor.
    pub flowers: Vec<Flower>,
    /// Ponds committed to the grid.
    pub ponds: Vec<Pond>,
    /// Decorative leaves.
    pub leaves: Vec<Leaf>,
    /// Forced-open rectangles carved into the maze.
    pub clearings: Vec<CellRect>,
    /// Entrance on the border.
    pub entrance: CellCoord,
    /// Exit on the border.
    pub exit: CellCoord,
    /// Diagnostics captured during generation.
    pub report: GenerationReport,
}

/// Fully generated level consumed by the world, movement, and renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    grid: Grid,
    tree_kinds: TreeKinds,
    flowers: Vec<Flower>,
    ponds: Vec<Pond>,
    leaves: Vec<Leaf>,
    clearings: Vec<CellRect>,
    entrance: CellCoord,
    exit: CellCoord,
    report: GenerationReport,
}

impl Level {
    /// Assembles a level from its generated parts.
    #[must_use]
    pub fn new(parts: LevelParts) -> Self {
        let LevelParts {
            grid,
            tree_kinds,
            flowers,
            ponds,
            leaves,
            clearings,
            entrance,
            exit,
            report,
        } = parts;
        Self {
            grid,
            tree_kinds,
            flowers,
            ponds,
            leaves,
            clearings,
            entrance,
            exit,
            report,
        }
    }

    /// Final cell states of the level.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Tree variety for every cell.
    #[must_use]
    pub const fn tree_kinds(&self) -> &TreeKinds {
        &self.tree_kinds
    }

    /// Flowers scattered over the floor.
    #[must_use]
    pub fn flowers(&self) -> &[Flower] {
        &self.flowers
    }

    /// Ponds committed to the grid.
    #[must_use]
    pub fn ponds(&self) -> &[Pond] {
        &self.ponds
    }

    /// Decorative leaves in row-major order.
    #[must_use]
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Clearings carved while building the maze.
    #[must_use]
    pub fn clearings(&self) -> &[CellRect] {
        &self.clearings
    }

    /// Entrance on the border.
    #[must_use]
    pub const fn entrance(&self) -> CellCoord {
        self.entrance
    }

    /// Exit on the border.
    #[must_use]
    pub const fn exit(&self) -> CellCoord {
        self.exit
    }

    /// Diagnostics captured during generation.
    #[must_use]
    pub const fn report(&self) -> &GenerationReport {
        &self.report
    }
}

/// Directional input sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MovementIntent {
    /// Move toward decreasing x.
    pub left: bool,
    /// Move toward increasing x.
    pub right: bool,
    /// Move toward decreasing y.
    pub up: bool,
    /// Move toward increasing y.
    pub down: bool,
    /// Request a jump.
    pub jump: bool,
}

impl MovementIntent {
    /// Horizontal axis in `-1..=1`.
    #[must_use]
    pub const fn horizontal(&self) -> i8 {
        self.right as i8 - self.left as i8
    }

    /// Vertical axis in `-1..=1`.
    #[must_use]
    pub const fn vertical(&self) -> i8 {
        self.down as i8 - self.up as i8
    }

    /// Reports whether the intent asks for any displacement.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.horizontal() != 0 || self.vertical() != 0
    }
}

/// Immutable representation of the player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Top-left corner of the player's cell-sized box in world units.
    pub position: WorldPoint,
    /// Direction the player faces.
    pub facing: Direction,
    /// Current animation state.
    pub animation: AnimationState,
    /// Index of the animation frame to present.
    pub frame: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offset_rejects_negative_coordinates() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, -2), Some(CellCoord::new(1, 0)));
        assert_eq!(origin.step(Direction::North), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn border_classification_excludes_corners_from_edges() {
        let grid = Grid::filled(5, 4, CellState::Wall);
        assert!(grid.is_border(CellCoord::new(0, 0)));
        assert!(!grid.is_border_edge(CellCoord::new(0, 0)));
        assert!(grid.is_border_edge(CellCoord::new(0, 2)));
        assert!(grid.is_border_edge(CellCoord::new(2, 3)));
        assert!(grid.is_interior(CellCoord::new(1, 1)));
        assert!(!grid.is_border(CellCoord::new(5, 0)));
    }

    #[test]
    fn inward_neighbor_points_into_interior() {
        let grid = Grid::filled(6, 6, CellState::Wall);
        assert_eq!(
            grid.inward_neighbor(CellCoord::new(0, 3)),
            Some(CellCoord::new(1, 3))
        );
        assert_eq!(
            grid.inward_neighbor(CellCoord::new(5, 2)),
            Some(CellCoord::new(4, 2))
        );
        assert_eq!(
            grid.inward_neighbor(CellCoord::new(3, 0)),
            Some(CellCoord::new(3, 1))
        );
        assert_eq!(
            grid.inward_neighbor(CellCoord::new(3, 5)),
            Some(CellCoord::new(3, 4))
        );
        assert_eq!(grid.inward_neighbor(CellCoord::new(0, 0)), None);
        assert_eq!(grid.inward_neighbor(CellCoord::new(2, 2)), None);
    }

    #[test]
    fn mirrored_swaps_border_sides() {
        let grid = Grid::filled(19, 15, CellState::Wall);
        assert_eq!(grid.mirrored(CellCoord::new(0, 5)), CellCoord::new(18, 5));
        assert_eq!(grid.mirrored(CellCoord::new(18, 5)), CellCoord::new(0, 5));
        assert_eq!(grid.mirrored(CellCoord::new(7, 0)), CellCoord::new(7, 14));
        assert_eq!(grid.mirrored(CellCoord::new(7, 14)), CellCoord::new(7, 0));
    }

    #[test]
    fn neighbors_stay_inside_grid() {
        let grid = Grid::filled(3, 3, CellState::Floor);
        let corner: Vec<_> = grid.neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(corner, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);
        assert_eq!(grid.neighbors(CellCoord::new(1, 1)).count(), 4);
    }

    #[test]
    fn reseal_border_keeps_openings_and_is_idempotent() {
        let mut grid = Grid::filled(5, 5, CellState::Floor);
        let entrance = CellCoord::new(0, 2);
        let exit = CellCoord::new(4, 3);
        grid.reseal_border(entrance, exit);
        let once = grid.clone();
        grid.reseal_border(entrance, exit);

        assert_eq!(grid, once);
        let open_border: Vec<_> = grid
            .iter()
            .filter(|(cell, state)| grid.is_border(*cell) && *state != CellState::Wall)
            .map(|(cell, _)| cell)
            .collect();
        assert_eq!(open_border, vec![entrance, exit]);
        assert!(grid.is(CellCoord::new(2, 2), CellState::Floor));
    }

    #[test]
    fn cell_rect_iterates_row_major_cells() {
        let rect =
            CellRect::from_origin_and_size(CellCoord::new(2, 3), CellRectSize::new(2, 2));
        let cells: Vec<_> = rect.cells().collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(2, 3),
                CellCoord::new(3, 3),
                CellCoord::new(2, 4),
                CellCoord::new(3, 4),
            ]
        );
        assert!(rect.contains(CellCoord::new(3, 4)));
        assert!(!rect.contains(CellCoord::new(4, 4)));
        assert!(!rect.contains(CellCoord::new(1, 3)));
    }

    #[test]
    fn pond_geometry_maps_tiles_to_cells() {
        let geometry = PondGeometry::new(16.0, 16.0);
        let mut mask = PondMask::empty(4);
        mask.fill(0, 0);
        mask.fill(3, 3);
        let pond = Pond::new(mask, WorldPoint::of_cell(CellCoord::new(5, 6), 16.0));

        let footprint: Vec<_> = geometry.footprint(&pond).collect();
        assert_eq!(footprint, vec![(3, 4), (6, 7)]);
        assert!(geometry.covers(&pond, CellCoord::new(6, 7)));
        assert!(!geometry.covers(&pond, CellCoord::new(5, 6)));
        assert!(geometry.bounds_contain(&pond, CellCoord::new(5, 6)));
        assert!(!geometry.bounds_contain(&pond, CellCoord::new(7, 6)));
        assert_eq!(geometry.mask_side(3), 6);
    }

    #[test]
    fn pond_mask_ignores_out_of_range_tiles() {
        let mut mask = PondMask::empty(3);
        mask.fill(-1, 0);
        mask.fill(3, 1);
        mask.fill(1, 1);
        assert_eq!(mask.water_count(), 1);
        assert!(mask.is_water(1, 1));
        assert!(!mask.is_water(-1, 0));
    }

    #[test]
    fn intent_axes_cancel_opposite_keys() {
        let intent = MovementIntent {
            left: true,
            right: true,
            down: true,
            ..MovementIntent::default()
        };
        assert_eq!(intent.horizontal(), 0);
        assert_eq!(intent.vertical(), 1);
        assert!(intent.is_moving());
        assert!(!MovementIntent::default().is_moving());
    }

    #[test]
    fn leaf_border_patterns_follow_direction() {
        assert_eq!(LeafPattern::border_facing(Direction::East), LeafPattern::ERight);
        assert_eq!(LeafPattern::border_facing(Direction::North), LeafPattern::ETop);
        assert!(LeafPattern::ECenter.is_primary());
        assert!(!LeafPattern::ETop.is_primary());
    }
}
