use std::time::Duration;

use anyhow::{Context, Result};
use grove_maze_core::{Command, Event, GameConfig, MovementIntent};
use grove_maze_system_level_generation::LevelGeneration;
use grove_maze_system_movement::Movement;
use grove_maze_world::{self as world, query, World};
use tracing::warn;

use crate::level_code::LevelCode;

/// Wires the world to the systems and routes events until the loop settles.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    generation: LevelGeneration,
    movement: Movement,
    pending_code: Option<LevelCode>,
}

impl Session {
    /// Creates a session whose first level is reproduced from `code` when present.
    pub(crate) fn new(config: &GameConfig, seed: u64, code: Option<LevelCode>) -> Result<Self> {
        let generation =
            LevelGeneration::new(config, seed).context("failed to prepare level generation")?;
        Ok(Self {
            world: World::new(config),
            generation,
            movement: Movement::new(config),
            pending_code: code,
        })
    }

    /// Authoritative world state.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Starts the game, installing the first level.
    pub(crate) fn start(&mut self) -> Vec<Event> {
        self.execute(Command::StartGame, MovementIntent::default())
    }

    /// Advances simulated time by `dt` while the player holds `intent`.
    pub(crate) fn advance(&mut self, dt: Duration, intent: MovementIntent) -> Vec<Event> {
        self.execute(Command::Tick { dt }, intent)
    }

    /// Completes the current level and waits out the transition to the next one.
    pub(crate) fn skip_level(&mut self, transition: Duration) -> Vec<Event> {
        let mut events = self.execute(Command::ReachExit, MovementIntent::default());
        events.extend(self.advance(transition, MovementIntent::default()));
        events
    }

    fn execute(&mut self, command: Command, intent: MovementIntent) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events, intent)
    }

    fn pump(&mut self, mut events: Vec<Event>, intent: MovementIntent) -> Vec<Event> {
        let mut observed = Vec::new();

        while !events.is_empty() {
            observed.extend(events.iter().cloned());

            let mut commands = Vec::new();
            self.install_pending_code(&mut events, &mut commands);
            self.generation.handle(&events, &mut commands);
            self.movement.handle(
                &events,
                intent,
                query::level(&self.world),
                query::player(&self.world),
                &mut commands,
            );

            events.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }

        observed
    }

    /// Answers the first level request with the level encoded by the pending code.
    fn install_pending_code(&mut self, events: &mut Vec<Event>, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::LevelRequested { .. }))
        {
            return;
        }
        let Some(code) = self.pending_code.take() else {
            return;
        };

        match self
            .generation
            .generator()
            .generate(Some(code.entrance), code.seed)
        {
            Ok(level) => {
                events.retain(|event| !matches!(event, Event::LevelRequested { .. }));
                out.push(Command::InstallLevel {
                    level: Box::new(level),
                });
            }
            Err(error) => warn!(%error, "level code rejected, generating a fresh level"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(events: &[Event]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::LevelInstalled { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_installs_the_first_level() {
        let config = GameConfig::default();
        let mut session = Session::new(&config, 11, None).expect("valid config");

        let events = session.start();

        assert_eq!(installed(&events), vec![1]);
        assert!(query::level(session.world()).is_some());
        assert!(query::player(session.world()).is_some());
    }

    #[test]
    fn skipping_installs_the_next_level_at_the_mirrored_entrance() {
        let config = GameConfig::default();
        let mut session = Session::new(&config, 11, None).expect("valid config");
        let _ = session.start();
        let first = query::level(session.world()).expect("level installed").clone();

        let events = session.skip_level(config.player.transition());

        assert_eq!(installed(&events), vec![2]);
        let second = query::level(session.world()).expect("level installed");
        assert_eq!(second.entrance(), world::next_entrance(&first));
    }

    #[test]
    fn level_code_reproduces_the_encoded_level() {
        let config = GameConfig::default();
        let mut original = Session::new(&config, 3, None).expect("valid config");
        let _ = original.start();
        let _ = original.skip_level(config.player.transition());
        let level = query::level(original.world()).expect("level installed");
        let code = LevelCode::of_level(level);

        let mut replay = Session::new(&config, 99, Some(code)).expect("valid config");
        let _ = replay.start();
        let replayed = query::level(replay.world()).expect("level installed");

        assert_eq!(replayed.grid(), level.grid());
        assert_eq!(replayed.entrance(), level.entrance());
        assert_eq!(replayed.exit(), level.exit());
        assert_eq!(replayed.leaves(), level.leaves());
    }

    #[test]
    fn time_moves_the_player_toward_the_interior() {
        let config = GameConfig::default();
        let mut session = Session::new(&config, 5, None).expect("valid config");
        let _ = session.start();
        let before = query::player(session.world()).expect("player spawned");
        let level = query::level(session.world()).expect("level installed");
        let inward = level
            .grid()
            .inward_direction(level.entrance())
            .expect("entrance lies on a border edge");

        let intent = match inward {
            grove_maze_core::Direction::North => MovementIntent {
                up: true,
                ..MovementIntent::default()
            },
            grove_maze_core::Direction::South => MovementIntent {
                down: true,
                ..MovementIntent::default()
            },
            grove_maze_core::Direction::East => MovementIntent {
                right: true,
                ..MovementIntent::default()
            },
            grove_maze_core::Direction::West => MovementIntent {
                left: true,
                ..MovementIntent::default()
            },
        };
        let events = session.advance(Duration::from_millis(50), intent);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::PlayerMoved { .. })));
        let after = query::player(session.world()).expect("player spawned");
        assert_ne!(after.position, before.position);
        assert_eq!(after.facing, inward);
    }
}
