#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grove Maze.

use std::time::Duration;

use grove_maze_core::{
    AnimationState, CellCoord, Command, Direction, Event, GameConfig, Level, PlayerConfig,
    WorldPoint, WELCOME_BANNER,
};
use tracing::{info, warn};

/// Represents the authoritative Grove Maze world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    cell_size: f32,
    player_config: PlayerConfig,
    level: Option<Level>,
    level_number: u32,
    player: Player,
    transition: Option<Duration>,
    tick_index: u64,
}

impl World {
    /// Creates a new world awaiting its first level.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            cell_size: config.grid.cell_size,
            player_config: config.player,
            level: None,
            level_number: 0,
            player: Player::default(),
            transition: None,
            tick_index: 0,
        }
    }

    fn install(&mut self, level: Level, out_events: &mut Vec<Event>) {
        let entrance = level.entrance();
        let exit = level.exit();
        let facing = level
            .grid()
            .inward_direction(entrance)
            .unwrap_or(Direction::South);
        self.player = Player::at(WorldPoint::of_cell(entrance, self.cell_size), facing);
        self.transition = None;
        if self.level_number == 0 {
            self.level_number = 1;
        }

        let report = *level.report();
        info!(
            number = self.level_number,
            seed = report.seed,
            ?entrance,
            ?exit,
            path_length = ?report.path_length,
            "level installed"
        );
        out_events.push(Event::LevelInstalled {
            number: self.level_number,
            entrance,
            exit,
        });
        if report.exit_degraded {
            warn!(
                number = self.level_number,
                required = report.required_path_length,
                actual = ?report.path_length,
                "level is shorter than required"
            );
            out_events.push(Event::LevelDegraded {
                number: self.level_number,
                required: report.required_path_length,
                actual: report.path_length,
            });
        }
        self.level = Some(level);
    }

    fn advance_transition(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(remaining) = self.transition else {
            return;
        };
        let remaining = remaining.saturating_sub(dt);
        if !remaining.is_zero() {
            self.transition = Some(remaining);
            return;
        }

        self.transition = None;
        self.level_number = self.level_number.saturating_add(1);
        let entrance = self.level.as_ref().map(next_entrance);
        out_events.push(Event::LevelRequested {
            number: self.level_number,
            entrance,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartGame => {
            world.level = None;
            world.level_number = 1;
            world.transition = None;
            world.player = Player::default();
            out_events.push(Event::LevelRequested {
                number: 1,
                entrance: None,
            });
        }
        Command::InstallLevel { level } => world.install(*level, out_events),
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.player.animate(dt, &world.player_config);
            world.advance_transition(dt, out_events);
        }
        Command::MovePlayer {
            position,
            facing,
            animation,
        } => {
            if world.level.is_none() || world.transition.is_some() {
                return;
            }
            let from = world.player.position;
            world.player.update(position, facing, animation);
            if from != position {
                out_events.push(Event::PlayerMoved { from, to: position });
            }
        }
        Command::ReachExit => {
            if world.level.is_none() || world.transition.is_some() {
                return;
            }
            world.transition = Some(world.player_config.transition());
            world.player.update(
                world.player.position,
                world.player.facing,
                AnimationState::Idle,
            );
            info!(number = world.level_number, "exit reached");
            out_events.push(Event::ExitReached {
                number: world.level_number,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use grove_maze_core::{CellCoord, Level, PlayerSnapshot};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Edge length of a grid cell in world units.
    #[must_use]
    pub fn cell_size(world: &World) -> f32 {
        world.cell_size
    }

    /// Active level, if one has been installed.
    #[must_use]
    pub fn level(world: &World) -> Option<&Level> {
        world.level.as_ref()
    }

    /// One-based number of the current level, zero before the game starts.
    #[must_use]
    pub fn level_number(world: &World) -> u32 {
        world.level_number
    }

    /// Exit cell of the active level.
    #[must_use]
    pub fn exit(world: &World) -> Option<CellCoord> {
        world.level.as_ref().map(Level::exit)
    }

    /// Snapshot of the player once a level is active.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerSnapshot> {
        if world.level.is_none() {
            return None;
        }
        Some(PlayerSnapshot {
            position: world.player.position,
            facing: world.player.facing,
            animation: world.player.animation,
            frame: world.player.frame,
        })
    }

    /// Time left before the next level is requested, while a level-complete transition runs.
    #[must_use]
    pub fn transition_remaining(world: &World) -> Option<Duration> {
        world.transition
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[derive(Clone, Copy, Debug)]
struct Player {
    position: WorldPoint,
    facing: Direction,
    animation: AnimationState,
    frame: u32,
    frame_elapsed: Duration,
}

impl Player {
    fn at(position: WorldPoint, facing: Direction) -> Self {
        Self {
            position,
            facing,
            ..Self::default()
        }
    }

    fn update(&mut self, position: WorldPoint, facing: Direction, animation: AnimationState) {
        if animation != self.animation {
            self.frame = 0;
            self.frame_elapsed = Duration::ZERO;
        }
        self.position = position;
        self.facing = facing;
        self.animation = animation;
    }

    /// Advances the walk cycle; idle and jumping players hold the first frame.
    fn animate(&mut self, dt: Duration, config: &PlayerConfig) {
        if self.animation != AnimationState::Walk {
            self.frame = 0;
            self.frame_elapsed = Duration::ZERO;
            return;
        }
        let frame_length = config.animation_frame();
        if frame_length.is_zero() || config.animation_frames == 0 {
            return;
        }
        self.frame_elapsed = self.frame_elapsed.saturating_add(dt);
        while self.frame_elapsed >= frame_length {
            self.frame_elapsed -= frame_length;
            self.frame = (self.frame + 1) % config.animation_frames;
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: WorldPoint::default(),
            facing: Direction::South,
            animation: AnimationState::Idle,
            frame: 0,
            frame_elapsed: Duration::ZERO,
        }
    }
}

/// Entrance the level following `exit` on `level` should use.
#[must_use]
pub fn next_entrance(level: &Level) -> CellCoord {
    level.grid().mirrored(level.exit())
}

#[cfg(test)]
mod tests {
    use grove_maze_core::{CellState, GenerationReport, Grid, LevelParts, TreeKinds};

    use super::*;

    fn corridor_level(degraded: bool) -> Level {
        let mut grid = Grid::filled(7, 7, CellState::Wall);
        for column in 0..7 {
            grid.set(CellCoord::new(column, 3), CellState::Floor);
        }
        Level::new(LevelParts {
            tree_kinds: TreeKinds::from_row_major(7, Vec::new()),
            grid,
            flowers: Vec::new(),
            ponds: Vec::new(),
            leaves: Vec::new(),
            clearings: Vec::new(),
            entrance: CellCoord::new(0, 3),
            exit: CellCoord::new(6, 3),
            report: GenerationReport {
                seed: 1,
                required_path_length: 6,
                path_length: Some(6),
                exit_degraded: degraded,
                exit_attempts: 1,
                fallback_corridor: false,
                ponds_rejected_for_connectivity: 0,
            },
        })
    }

    fn started_world() -> (World, Vec<Event>) {
        let mut world = World::new(&GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);
        apply(
            &mut world,
            Command::InstallLevel {
                level: Box::new(corridor_level(false)),
            },
            &mut events,
        );
        (world, events)
    }

    #[test]
    fn start_game_requests_first_level() {
        let mut world = World::new(&GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);

        assert_eq!(
            events,
            vec![Event::LevelRequested {
                number: 1,
                entrance: None,
            }]
        );
        assert!(query::player(&world).is_none());
        assert_eq!(query::level_number(&world), 1);
    }

    #[test]
    fn install_places_player_at_entrance_facing_inward() {
        let (world, events) = started_world();
        let player = query::player(&world).expect("player after install");

        assert_eq!(player.position, WorldPoint::new(0.0, 48.0));
        assert_eq!(player.facing, Direction::East);
        assert_eq!(player.animation, AnimationState::Idle);
        assert!(events.contains(&Event::LevelInstalled {
            number: 1,
            entrance: CellCoord::new(0, 3),
            exit: CellCoord::new(6, 3),
        }));
    }

    #[test]
    fn degraded_level_is_announced() {
        let mut world = World::new(&GameConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartGame, &mut events);
        apply(
            &mut world,
            Command::InstallLevel {
                level: Box::new(corridor_level(true)),
            },
            &mut events,
        );
        assert!(events.contains(&Event::LevelDegraded {
            number: 1,
            required: 6,
            actual: Some(6),
        }));
    }

    #[test]
    fn reaching_exit_requests_mirrored_entrance_after_transition() {
        let (mut world, _) = started_world();
        let mut events = Vec::new();
        apply(&mut world, Command::ReachExit, &mut events);
        assert_eq!(events, vec![Event::ExitReached { number: 1 }]);
        assert_eq!(
            query::transition_remaining(&world),
            Some(Duration::from_secs(1))
        );

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(600),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_millis(600)
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(400),
            },
            &mut events,
        );
        assert!(events.contains(&Event::LevelRequested {
            number: 2,
            entrance: Some(CellCoord::new(0, 3)),
        }));
        assert_eq!(query::level_number(&world), 2);
        assert_eq!(query::transition_remaining(&world), None);
    }

    #[test]
    fn movement_is_frozen_during_transition() {
        let (mut world, _) = started_world();
        let mut events = Vec::new();
        apply(&mut world, Command::ReachExit, &mut events);
        apply(&mut world, Command::ReachExit, &mut events);
        assert_eq!(events.len(), 1);

        events.clear();
        apply(
            &mut world,
            Command::MovePlayer {
                position: WorldPoint::new(10.0, 48.0),
                facing: Direction::East,
                animation: AnimationState::Walk,
            },
            &mut events,
        );
        assert!(events.is_empty());
        let player = query::player(&world).expect("player");
        assert_eq!(player.position, WorldPoint::new(0.0, 48.0));
    }

    #[test]
    fn walking_advances_animation_frames() {
        let (mut world, _) = started_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MovePlayer {
                position: WorldPoint::new(2.0, 48.0),
                facing: Direction::East,
                animation: AnimationState::Walk,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::PlayerMoved {
                from: WorldPoint::new(0.0, 48.0),
                to: WorldPoint::new(2.0, 48.0),
            }]
        );

        for _ in 0..7 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(200),
                },
                &mut events,
            );
        }
        assert_eq!(query::player(&world).map(|p| p.frame), Some(1));

        apply(
            &mut world,
            Command::MovePlayer {
                position: WorldPoint::new(2.0, 48.0),
                facing: Direction::East,
                animation: AnimationState::Idle,
            },
            &mut events,
        );
        assert_eq!(query::player(&world).map(|p| p.frame), Some(0));
    }

    #[test]
    fn next_entrance_mirrors_exit() {
        assert_eq!(next_entrance(&corridor_level(false)), CellCoord::new(0, 3));
    }
}
