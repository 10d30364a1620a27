#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Grove Maze.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Sprites are optional: when the manifest cannot be loaded the backend logs a
//! warning and draws every element with primitives instead.

mod sprites;

use anyhow::Result;
use glam::Vec2;
use grove_maze_core::{LeafPattern, MovementIntent};
use grove_maze_rendering::{
    Color, FrameInput, Presentation, RenderingBackend, Scene, SpriteKey, TerrainCell,
};
use macroquad::input::{is_key_down, is_key_pressed, KeyCode};
use std::{path::PathBuf, time::Duration};
use tracing::{info, warn};

use self::sprites::{draw_sprite, SpriteAtlas, SpriteQuad};

const FLOOR_COLOR: Color = Color::from_rgb_u8(112, 156, 76);
const TREE_COLOR: Color = Color::from_rgb_u8(34, 86, 38);
const APPLE_COLOR: Color = Color::from_rgb_u8(196, 40, 36);
const WATER_COLOR: Color = Color::from_rgb_u8(58, 120, 196);
const LEAF_COLOR: Color = Color::from_rgb_u8(168, 120, 48);
const PLAYER_COLOR: Color = Color::from_rgb_u8(236, 220, 180);
const EXIT_COLOR: Color = Color::from_rgb_u8(250, 230, 90);
const ENTRANCE_COLOR: Color = Color::from_rgb_u8(90, 200, 250);
const HUD_COLOR: Color = Color::from_rgb_u8(255, 255, 255);

/// Vertical space reserved above the grid for the level counter, in screen pixels.
const HUD_HEIGHT: f32 = 32.0;

/// Keys observed during a single frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    /// Left arrow or `A` held.
    pub left: bool,
    /// Right arrow or `D` held.
    pub right: bool,
    /// Up arrow or `W` held.
    pub up: bool,
    /// Down arrow or `S` held.
    pub down: bool,
    /// `Space` pressed this frame.
    pub jump_pressed: bool,
    /// `F3` pressed this frame.
    pub debug_pressed: bool,
    /// `Escape` or `Q` pressed this frame.
    pub quit_pressed: bool,
}

impl KeyboardState {
    fn poll() -> Self {
        Self {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            up: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            jump_pressed: is_key_pressed(KeyCode::Space),
            debug_pressed: is_key_pressed(KeyCode::F3),
            quit_pressed: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
        }
    }

    /// Frame input derived from the observed keys.
    #[must_use]
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            intent: MovementIntent {
                left: self.left,
                right: self.right,
                up: self.up,
                down: self.down,
                jump: self.jump_pressed,
            },
            toggle_debug_overlay: self.debug_pressed,
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    sprite_manifest: Option<PathBuf>,
    player_frames: u32,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            sprite_manifest: Some(SpriteAtlas::default_manifest_path()),
            player_frames: 6,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.swap_interval = if enabled { Some(1) } else { Some(0) };
        self
    }

    /// Loads sprites from the provided manifest, or draws primitives only when `None`.
    #[must_use]
    pub fn with_sprite_manifest(mut self, manifest: Option<PathBuf>) -> Self {
        self.sprite_manifest = manifest;
        self
    }

    /// Number of frames in each player sprite sheet.
    #[must_use]
    pub fn with_player_frames(mut self, frames: u32) -> Self {
        self.player_frames = frames.max(1);
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            sprite_manifest,
            player_frames,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 800,
            window_height: 832,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let sprite_atlas = sprite_manifest.and_then(|path| {
                match SpriteAtlas::from_manifest_path(&path) {
                    Ok(atlas) => {
                        info!(sprites = atlas.len(), path = %path.display(), "sprite atlas loaded");
                        Some(atlas)
                    }
                    Err(error) => {
                        warn!("sprite atlas unavailable, drawing primitives: {error:#}");
                        None
                    }
                }
            });
            let background = to_macroquad_color(clear_color);

            loop {
                let keyboard = KeyboardState::poll();
                if keyboard.quit_pressed {
                    break;
                }

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                update_scene(frame_dt, keyboard.frame_input(), &mut scene);

                macroquad::window::clear_background(background);
                let metrics = SceneMetrics::from_scene(
                    &scene,
                    macroquad::window::screen_width(),
                    macroquad::window::screen_height(),
                );
                let painter = Painter {
                    metrics: &metrics,
                    atlas: sprite_atlas.as_ref(),
                };
                painter.terrain(&scene);
                painter.ponds(&scene);
                painter.flowers(&scene);
                painter.leaves(&scene);
                painter.exit_highlight(&scene);
                if scene.debug_overlay {
                    painter.debug_overlay(&scene);
                }
                painter.player(&scene, player_frames);
                draw_hud(&scene, &metrics);

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Maps world units onto the window, keeping the grid centered below the HUD.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    cell_step: f32,
    screen_width: f32,
    screen_height: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let world_width = scene.width();
        let world_height = scene.height();
        let available_height = (screen_height - HUD_HEIGHT).max(0.0);
        let scale = if world_width <= f32::EPSILON || world_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / world_width).min(available_height / world_height)
        };

        let offset_x = ((screen_width - world_width * scale) * 0.5).max(0.0);
        let offset_y = HUD_HEIGHT + ((available_height - world_height * scale) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            cell_step: scene.cell_size * scale,
            screen_width,
            screen_height,
        }
    }

    fn to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + world.x * self.scale,
            self.offset_y + world.y * self.scale,
        )
    }

    fn cell_origin(&self, column: u32, row: u32) -> Vec2 {
        Vec2::new(
            self.offset_x + column as f32 * self.cell_step,
            self.offset_y + row as f32 * self.cell_step,
        )
    }
}

/// Draws scene layers, preferring sprites and falling back to primitives.
struct Painter<'a> {
    metrics: &'a SceneMetrics,
    atlas: Option<&'a SpriteAtlas>,
}

impl Painter<'_> {
    fn sprite(&self, key: SpriteKey, quad: SpriteQuad) -> bool {
        match self.atlas.and_then(|atlas| atlas.get(key)) {
            Some(texture) => {
                draw_sprite(texture, quad);
                true
            }
            None => false,
        }
    }

    fn terrain(&self, scene: &Scene) {
        let step = self.metrics.cell_step;
        let grid = self.metrics.cell_origin(0, 0);
        rectangle(
            grid,
            Vec2::new(scene.columns as f32 * step, scene.rows as f32 * step),
            FLOOR_COLOR,
        );

        for (index, cell) in scene.terrain.iter().enumerate() {
            let TerrainCell::Tree { kind } = *cell else {
                continue;
            };
            let (column, row) = cell_of_index(index, scene.columns);
            let origin = self.metrics.cell_origin(column, row);
            let key = SpriteKey::for_tree(kind);
            if self.sprite(key, SpriteQuad::new(origin, Vec2::splat(step))) {
                continue;
            }
            let center = origin + Vec2::splat(step * 0.5);
            macroquad::shapes::draw_circle(
                center.x,
                center.y,
                step * 0.45,
                to_macroquad_color(TREE_COLOR),
            );
            if key == SpriteKey::AppleTree {
                macroquad::shapes::draw_circle(
                    center.x + step * 0.15,
                    center.y - step * 0.1,
                    step * 0.1,
                    to_macroquad_color(APPLE_COLOR),
                );
            }
        }
    }

    fn ponds(&self, scene: &Scene) {
        for pond in &scene.ponds {
            let size = Vec2::splat(pond.tile_size * self.metrics.scale);
            for tile in &pond.tiles {
                let origin = self.metrics.to_screen(*tile);
                if !self.sprite(SpriteKey::Water, SpriteQuad::new(origin, size)) {
                    rectangle(origin, size, WATER_COLOR);
                }
            }
        }
    }

    fn flowers(&self, scene: &Scene) {
        let step = self.metrics.cell_step;
        for flower in &scene.flowers {
            let origin = self.metrics.cell_origin(flower.cell.column(), flower.cell.row());
            let key = SpriteKey::Flower { kind: flower.kind };
            if self.sprite(key, SpriteQuad::new(origin, Vec2::splat(step))) {
                continue;
            }
            let center = origin + Vec2::splat(step * 0.5);
            macroquad::shapes::draw_circle(
                center.x,
                center.y,
                step * 0.15,
                to_macroquad_color(flower_color(flower.kind)),
            );
        }
    }

    fn leaves(&self, scene: &Scene) {
        let step = self.metrics.cell_step;
        for leaf in &scene.leaves {
            let origin = self.metrics.cell_origin(leaf.cell.column(), leaf.cell.row());
            if scene.debug_overlay {
                rectangle(
                    origin,
                    Vec2::splat(step),
                    leaf_debug_color(leaf.pattern).with_alpha(0.6),
                );
                continue;
            }
            let key = SpriteKey::Leaf {
                pattern: leaf.pattern,
            };
            if !self.sprite(key, SpriteQuad::new(origin, Vec2::splat(step))) {
                rectangle(
                    origin + Vec2::splat(step * 0.3),
                    Vec2::splat(step * 0.4),
                    LEAF_COLOR.with_alpha(0.7),
                );
            }
        }
    }

    fn exit_highlight(&self, scene: &Scene) {
        let Some(exit) = scene.exit else {
            return;
        };
        let origin = self.metrics.cell_origin(exit.column(), exit.row());
        rectangle(
            origin,
            Vec2::splat(self.metrics.cell_step),
            EXIT_COLOR.with_alpha(0.35),
        );
    }

    fn debug_overlay(&self, scene: &Scene) {
        let step = self.metrics.cell_step;
        let line = to_macroquad_color(Color::new(0.0, 0.0, 0.0, 0.25));
        let top_left = self.metrics.cell_origin(0, 0);
        let width = scene.columns as f32 * step;
        let height = scene.rows as f32 * step;
        for column in 0..=scene.columns {
            let x = top_left.x + column as f32 * step;
            macroquad::shapes::draw_line(x, top_left.y, x, top_left.y + height, 1.0, line);
        }
        for row in 0..=scene.rows {
            let y = top_left.y + row as f32 * step;
            macroquad::shapes::draw_line(top_left.x, y, top_left.x + width, y, 1.0, line);
        }

        for (cell, color) in [(scene.entrance, ENTRANCE_COLOR), (scene.exit, EXIT_COLOR)] {
            let Some(cell) = cell else {
                continue;
            };
            let origin = self.metrics.cell_origin(cell.column(), cell.row());
            macroquad::shapes::draw_rectangle_lines(
                origin.x,
                origin.y,
                step,
                step,
                3.0,
                to_macroquad_color(color),
            );
        }
    }

    fn player(&self, scene: &Scene, frames: u32) {
        let Some(player) = scene.player else {
            return;
        };
        let origin = self.metrics.to_screen(player.position);
        let step = self.metrics.cell_step;
        let quad = SpriteQuad::new(origin, Vec2::splat(step)).sheet_frame(player.frame, frames);
        if self.sprite(player.sprite, quad) {
            return;
        }
        let center = origin + Vec2::splat(step * 0.5);
        macroquad::shapes::draw_circle(
            center.x,
            center.y,
            step * 0.35,
            to_macroquad_color(PLAYER_COLOR),
        );
    }
}

fn draw_hud(scene: &Scene, metrics: &SceneMetrics) {
    let color = to_macroquad_color(HUD_COLOR);
    if let Some(label) = &scene.hud.level_label {
        let _ = macroquad::text::draw_text(label, 8.0, HUD_HEIGHT - 8.0, 28.0, color);
    }

    let Some(lines) = &scene.hud.message else {
        return;
    };
    macroquad::shapes::draw_rectangle(
        0.0,
        0.0,
        metrics.screen_width,
        metrics.screen_height,
        to_macroquad_color(Color::new(0.0, 0.0, 0.0, 0.5)),
    );
    for (index, line) in lines.iter().enumerate() {
        let font_size = 36.0;
        let dimensions = macroquad::text::measure_text(line, None, font_size as u16, 1.0);
        let x = (metrics.screen_width - dimensions.width) * 0.5;
        let y = metrics.screen_height * 0.5 + index as f32 * font_size * 1.2;
        let _ = macroquad::text::draw_text(line, x, y, font_size, color);
    }
}

fn rectangle(origin: Vec2, size: Vec2, color: Color) {
    macroquad::shapes::draw_rectangle(
        origin.x,
        origin.y,
        size.x,
        size.y,
        to_macroquad_color(color),
    );
}

fn cell_of_index(index: usize, columns: u32) -> (u32, u32) {
    let columns = columns.max(1) as usize;
    ((index % columns) as u32, (index / columns) as u32)
}

fn flower_color(kind: grove_maze_core::FlowerKind) -> Color {
    match kind {
        grove_maze_core::FlowerKind::White => Color::from_rgb_u8(245, 245, 240),
        grove_maze_core::FlowerKind::Mauve => Color::from_rgb_u8(190, 140, 200),
        grove_maze_core::FlowerKind::Red => Color::from_rgb_u8(220, 50, 60),
    }
}

/// Color coding of leaf pattern families in the debug overlay.
fn leaf_debug_color(pattern: LeafPattern) -> Color {
    if pattern.is_primary() {
        return Color::from_rgb_u8(220, 40, 40);
    }
    if LeafPattern::X_BLOCK.contains(&pattern) {
        return Color::from_rgb_u8(40, 80, 220);
    }
    if LeafPattern::SINGLE.contains(&pattern) {
        return Color::from_rgb_u8(240, 240, 60);
    }
    match pattern {
        LeafPattern::A => Color::from_rgb_u8(240, 140, 30),
        LeafPattern::TwoLeaves1 | LeafPattern::TwoLeaves2 => Color::from_rgb_u8(60, 200, 200),
        _ => Color::from_rgb_u8(200, 60, 200),
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
