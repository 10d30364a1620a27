#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grove Maze adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use grove_maze_core::{
    AnimationState, CellCoord, CellState, Direction, Flower, FlowerKind, Leaf, LeafPattern, Level,
    MovementIntent, PlayerSnapshot, PondGeometry, TreeKind,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Movement and jump intent sampled this frame.
    pub intent: MovementIntent,
    /// Whether the adapter detected a debug overlay toggle press on this frame.
    pub toggle_debug_overlay: bool,
}

/// Identifies a sprite stored in an adapter's atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// Player sprite sheet for one animation state and facing.
    Player {
        /// Animation being played.
        state: AnimationState,
        /// Direction the player faces.
        direction: Direction,
    },
    /// Ordinary tree drawn on wall cells.
    Tree,
    /// Apple tree drawn on wall cells.
    AppleTree,
    /// Water tile drawn for ponds.
    Water,
    /// Flower decoration.
    Flower {
        /// Variety of the flower.
        kind: FlowerKind,
    },
    /// Leaf overlay.
    Leaf {
        /// Pattern painted on the cell.
        pattern: LeafPattern,
    },
}

impl SpriteKey {
    /// Every sprite key in canonical order.
    #[must_use]
    pub fn all() -> Vec<SpriteKey> {
        let mut keys = Vec::new();
        for state in AnimationState::ALL {
            for direction in Direction::ALL {
                keys.push(SpriteKey::Player { state, direction });
            }
        }
        keys.extend([SpriteKey::Tree, SpriteKey::AppleTree, SpriteKey::Water]);
        keys.extend(FlowerKind::ALL.map(|kind| SpriteKey::Flower { kind }));
        keys.extend(LeafPattern::ALL.map(|pattern| SpriteKey::Leaf { pattern }));
        keys
    }

    /// Sprite presenting the provided player snapshot.
    #[must_use]
    pub const fn for_player(player: &PlayerSnapshot) -> Self {
        SpriteKey::Player {
            state: player.animation,
            direction: player.facing,
        }
    }

    /// Sprite presenting a tree of the provided kind.
    #[must_use]
    pub const fn for_tree(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Normal => SpriteKey::Tree,
            TreeKind::Apple => SpriteKey::AppleTree,
        }
    }

    /// Name identifying the sprite in asset manifests, for example `player_walk_north`.
    #[must_use]
    pub fn manifest_name(self) -> String {
        match self {
            SpriteKey::Player { state, direction } => {
                format!("player_{}_{}", state_name(state), direction_name(direction))
            }
            SpriteKey::Tree => "tree".to_owned(),
            SpriteKey::AppleTree => "apple_tree".to_owned(),
            SpriteKey::Water => "water".to_owned(),
            SpriteKey::Flower { kind } => format!("flower_{}", flower_name(kind)),
            SpriteKey::Leaf { pattern } => format!("leaf_{}", leaf_name(pattern)),
        }
    }

    /// Resolves a manifest name back into its key.
    pub fn from_manifest_name(name: &str) -> Result<Self, RenderingError> {
        Self::all()
            .into_iter()
            .find(|key| key.manifest_name() == name)
            .ok_or_else(|| RenderingError::UnknownSprite {
                name: name.to_owned(),
            })
    }
}

fn state_name(state: AnimationState) -> &'static str {
    match state {
        AnimationState::Idle => "idle",
        AnimationState::Walk => "walk",
        AnimationState::Jump => "jump",
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::North => "north",
        Direction::East => "east",
        Direction::South => "south",
        Direction::West => "west",
    }
}

fn flower_name(kind: FlowerKind) -> &'static str {
    match kind {
        FlowerKind::White => "white",
        FlowerKind::Mauve => "mauve",
        FlowerKind::Red => "red",
    }
}

fn leaf_name(pattern: LeafPattern) -> &'static str {
    match pattern {
        LeafPattern::A => "a",
        LeafPattern::B => "b",
        LeafPattern::C => "c",
        LeafPattern::D => "d",
        LeafPattern::ECenter => "e_center",
        LeafPattern::ERight => "e_right",
        LeafPattern::ELeft => "e_left",
        LeafPattern::ETop => "e_top",
        LeafPattern::EBottom => "e_bottom",
        LeafPattern::XTopLeft => "x_top_left",
        LeafPattern::XTopRight => "x_top_right",
        LeafPattern::XBottomLeft => "x_bottom_left",
        LeafPattern::XBottomRight => "x_bottom_right",
        LeafPattern::TwoLeaves1 => "two_leaves_1",
        LeafPattern::TwoLeaves2 => "two_leaves_2",
        LeafPattern::SingleTopLeft => "single_top_left",
        LeafPattern::SingleTopRight => "single_top_right",
        LeafPattern::SingleBottomLeft => "single_bottom_left",
        LeafPattern::SingleBottomRight => "single_bottom_right",
    }
}

/// What occupies a terrain cell, as far as drawing is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainCell {
    /// Walkable ground.
    Floor,
    /// Tree standing on a wall cell.
    Tree {
        /// Variety of the tree.
        kind: TreeKind,
    },
    /// Cell covered by a pond.
    Water,
}

/// Water tiles of one pond in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenePond {
    /// Top-left corner of every water tile.
    pub tiles: Vec<Vec2>,
    /// Edge length of a water tile.
    pub tile_size: f32,
}

/// Player sprite placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerPresentation {
    /// Top-left corner of the player's cell-sized box in world units.
    pub position: Vec2,
    /// Sprite sheet to draw.
    pub sprite: SpriteKey,
    /// Frame of the sheet to draw.
    pub frame: u32,
}

/// Text overlays drawn on top of the level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HudPresentation {
    /// Level counter, for example `Level 3`.
    pub level_label: Option<String>,
    /// Centered message lines shown during the level-complete transition.
    pub message: Option<[String; 2]>,
}

/// Scene description combining the terrain, decorations and the player.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Number of columns in the level grid.
    pub columns: u32,
    /// Number of rows in the level grid.
    pub rows: u32,
    /// Edge length of a cell in world units.
    pub cell_size: f32,
    /// Row-major terrain of the level.
    pub terrain: Vec<TerrainCell>,
    /// Ponds drawn tile by tile.
    pub ponds: Vec<ScenePond>,
    /// Flowers scattered across the floor.
    pub flowers: Vec<Flower>,
    /// Leaf overlays.
    pub leaves: Vec<Leaf>,
    /// Entrance of the active level.
    pub entrance: Option<CellCoord>,
    /// Exit of the active level.
    pub exit: Option<CellCoord>,
    /// Player placement, once a level is active.
    pub player: Option<PlayerPresentation>,
    /// Text overlays.
    pub hud: HudPresentation,
    /// Whether grid lines, entrance/exit markers and leaf pattern colors are shown.
    pub debug_overlay: bool,
}

impl Scene {
    /// Creates an empty scene for a grid of the provided dimensions.
    ///
    /// Returns an error when `cell_size` is not positive.
    pub fn new(columns: u32, rows: u32, cell_size: f32) -> Result<Self, RenderingError> {
        if cell_size.is_nan() || cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }

        let cells = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Ok(Self {
            columns,
            rows,
            cell_size,
            terrain: vec![TerrainCell::Floor; cells],
            ponds: Vec::new(),
            flowers: Vec::new(),
            leaves: Vec::new(),
            entrance: None,
            exit: None,
            player: None,
            hud: HudPresentation::default(),
            debug_overlay: false,
        })
    }

    /// Width of the grid in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Height of the grid in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Replaces the terrain and decorations with the contents of `level`.
    pub fn install_level(&mut self, level: &Level, geometry: &PondGeometry) {
        let grid = level.grid();
        self.columns = grid.columns();
        self.rows = grid.rows();
        self.terrain = grid
            .iter()
            .map(|(cell, state)| match state {
                CellState::Floor => TerrainCell::Floor,
                CellState::Wall => TerrainCell::Tree {
                    kind: level.tree_kinds().kind(cell),
                },
                CellState::Pond => TerrainCell::Water,
            })
            .collect();
        self.ponds = level
            .ponds()
            .iter()
            .map(|pond| ScenePond {
                tiles: pond
                    .shape()
                    .water_tiles()
                    .map(|(x, y)| {
                        let origin = geometry.tile_origin(pond, x, y);
                        Vec2::new(origin.x, origin.y)
                    })
                    .collect(),
                tile_size: geometry.scaled_tile(),
            })
            .collect();
        self.flowers = level.flowers().to_vec();
        self.leaves = level.leaves().to_vec();
        self.entrance = Some(level.entrance());
        self.exit = Some(level.exit());
    }

    /// Updates the player placement from a world snapshot.
    pub fn set_player(&mut self, player: Option<PlayerSnapshot>) {
        self.player = player.map(|snapshot| PlayerPresentation {
            position: Vec2::new(snapshot.position.x, snapshot.position.y),
            sprite: SpriteKey::for_player(&snapshot),
            frame: snapshot.frame,
        });
    }

    /// Terrain of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn terrain_at(&self, cell: CellCoord) -> Option<TerrainCell> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let index = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.terrain.get(index).copied()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Grove Maze scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cells must have a positive size.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// A manifest referenced a sprite name no key maps to.
    UnknownSprite {
        /// Offending name.
        name: String,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
            Self::UnknownSprite { name } => write!(f, "unknown sprite `{name}`"),
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_maze_core::{GenerationReport, Grid, LevelParts, Pond, PondMask, TreeKinds, WorldPoint};
    use std::collections::HashSet;

    fn sample_level() -> Level {
        let mut grid = Grid::filled(7, 7, CellState::Wall);
        for column in 0..7 {
            grid.set(CellCoord::new(column, 3), CellState::Floor);
        }
        grid.set(CellCoord::new(3, 2), CellState::Pond);
        let mut kinds = vec![TreeKind::Normal; 49];
        kinds[8] = TreeKind::Apple;
        let mut mask = PondMask::empty(2);
        mask.fill(0, 0);
        Level::new(LevelParts {
            grid,
            tree_kinds: TreeKinds::from_row_major(7, kinds),
            flowers: vec![Flower {
                cell: CellCoord::new(2, 3),
                kind: FlowerKind::Red,
            }],
            ponds: vec![Pond::new(mask, WorldPoint::new(56.0, 40.0))],
            leaves: vec![Leaf {
                cell: CellCoord::new(4, 3),
                pattern: LeafPattern::A,
            }],
            clearings: Vec::new(),
            entrance: CellCoord::new(0, 3),
            exit: CellCoord::new(6, 3),
            report: GenerationReport {
                seed: 0,
                required_path_length: 6,
                path_length: Some(6),
                exit_degraded: false,
                exit_attempts: 1,
                fallback_corridor: false,
                ponds_rejected_for_connectivity: 0,
            },
        })
    }

    #[test]
    fn scene_creation_rejects_non_positive_cell_size_without_panicking() {
        let error = Scene::new(5, 5, 0.0).expect_err("zero cell size must be rejected");
        assert!(matches!(error, RenderingError::InvalidCellSize { .. }));
        assert!(Scene::new(5, 5, f32::NAN).is_err());

        let scene = Scene::new(5, 4, 16.0).expect("positive cell size should succeed");
        assert_eq!(scene.terrain.len(), 20);
        assert_eq!(scene.width(), 80.0);
        assert_eq!(scene.height(), 64.0);
    }

    #[test]
    fn install_level_maps_terrain_and_decorations() {
        let level = sample_level();
        let geometry = PondGeometry::new(16.0, 16.0);
        let mut scene = Scene::new(3, 3, 16.0).expect("valid scene");
        scene.install_level(&level, &geometry);

        assert_eq!(scene.columns, 7);
        assert_eq!(scene.terrain.len(), 49);
        assert_eq!(
            scene.terrain_at(CellCoord::new(1, 1)),
            Some(TerrainCell::Tree {
                kind: TreeKind::Apple
            })
        );
        assert_eq!(
            scene.terrain_at(CellCoord::new(3, 2)),
            Some(TerrainCell::Water)
        );
        assert_eq!(
            scene.terrain_at(CellCoord::new(3, 3)),
            Some(TerrainCell::Floor)
        );
        assert_eq!(scene.terrain_at(CellCoord::new(7, 3)), None);
        assert_eq!(scene.ponds.len(), 1);
        assert_eq!(scene.ponds[0].tiles.len(), 1);
        assert_eq!(scene.ponds[0].tile_size, 16.0);
        assert_eq!(scene.flowers.len(), 1);
        assert_eq!(scene.leaves.len(), 1);
        assert_eq!(scene.exit, Some(CellCoord::new(6, 3)));
    }

    #[test]
    fn player_sprite_follows_animation_and_facing() {
        let mut scene = Scene::new(7, 7, 16.0).expect("valid scene");
        scene.set_player(Some(PlayerSnapshot {
            position: WorldPoint::new(4.0, 48.0),
            facing: Direction::West,
            animation: AnimationState::Walk,
            frame: 3,
        }));
        let player = scene.player.expect("player presentation");
        assert_eq!(
            player.sprite,
            SpriteKey::Player {
                state: AnimationState::Walk,
                direction: Direction::West,
            }
        );
        assert_eq!(player.frame, 3);
        assert_eq!(player.position, Vec2::new(4.0, 48.0));
        assert_eq!(player.sprite.manifest_name(), "player_walk_west");
    }

    #[test]
    fn manifest_names_are_unique_and_round_trip() {
        let keys = SpriteKey::all();
        assert_eq!(keys.len(), 12 + 3 + 3 + 19);
        let names: HashSet<_> = keys.iter().map(|key| key.manifest_name()).collect();
        assert_eq!(names.len(), keys.len());

        assert_eq!(
            SpriteKey::from_manifest_name("leaf_x_top_left"),
            Ok(SpriteKey::Leaf {
                pattern: LeafPattern::XTopLeft
            })
        );
        assert_eq!(
            SpriteKey::from_manifest_name("dragon"),
            Err(RenderingError::UnknownSprite {
                name: "dragon".to_owned()
            })
        );
    }

    #[test]
    fn tree_sprites_follow_kind() {
        assert_eq!(SpriteKey::for_tree(TreeKind::Normal), SpriteKey::Tree);
        assert_eq!(SpriteKey::for_tree(TreeKind::Apple), SpriteKey::AppleTree);
    }

    #[test]
    fn lighten_moves_towards_white() {
        let color = Color::from_rgb_u8(0, 0, 0).lighten(0.5);
        assert_eq!(color, Color::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(color.with_alpha(0.25).alpha, 0.25);
    }
}
