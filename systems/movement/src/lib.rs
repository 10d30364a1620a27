#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that turns player intent into resolved moves.

mod collision;

use std::time::Duration;

use glam::Vec2;
use grove_maze_core::{
    AnimationState, CollisionConfig, Command, Direction, Event, GameConfig, Level, MovementIntent,
    PlayerConfig, PlayerSnapshot, WorldPoint,
};
use tracing::debug;

use crate::collision::Collider;

/// Pure system that reacts to world events and emits movement commands.
#[derive(Debug)]
pub struct Movement {
    player: PlayerConfig,
    collision: CollisionConfig,
    cell_size: f32,
    jump: JumpState,
    frozen: bool,
}

impl Movement {
    /// Creates the system from the player and collision settings.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            player: config.player,
            collision: config.collision,
            cell_size: config.grid.cell_size,
            jump: JumpState::default(),
            frozen: true,
        }
    }

    /// Consumes world events and the sampled intent to emit movement commands.
    ///
    /// Nothing moves until a level is installed, and movement stops from the
    /// moment the exit is reached until the next level arrives.
    pub fn handle(
        &mut self,
        events: &[Event],
        intent: MovementIntent,
        level: Option<&Level>,
        player: Option<PlayerSnapshot>,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => dt = dt.saturating_add(*step),
                Event::LevelInstalled { .. } => {
                    self.frozen = false;
                    self.jump = JumpState::default();
                }
                Event::ExitReached { .. } => self.frozen = true,
                _ => {}
            }
        }

        if dt.is_zero() || self.frozen {
            return;
        }
        let (Some(level), Some(player)) = (level, player) else {
            return;
        };

        let jumping = self.jump.update(dt, intent.jump, &self.player);

        let collider = Collider::new(
            level.grid(),
            self.cell_size,
            self.player.hitbox_size,
            self.collision,
        );
        let start = Vec2::new(player.position.x, player.position.y);
        let delta = step_delta(intent, self.player.speed, dt);
        let resolved = collider.advance(start, delta);

        let facing = facing_for(intent, player.facing);
        let animation = if jumping {
            AnimationState::Jump
        } else if intent.is_moving() {
            AnimationState::Walk
        } else {
            AnimationState::Idle
        };

        let position = WorldPoint::new(resolved.x, resolved.y);
        if position != player.position || facing != player.facing || animation != player.animation
        {
            out.push(Command::MovePlayer {
                position,
                facing,
                animation,
            });
        }

        if collider.reaches_exit(resolved, level.exit()) {
            debug!(exit = ?level.exit(), "player reached the exit");
            self.frozen = true;
            out.push(Command::ReachExit);
        }
    }
}

/// Displacement requested by `intent` over `dt`, with diagonals normalised.
fn step_delta(intent: MovementIntent, speed: f32, dt: Duration) -> Vec2 {
    let mut direction = Vec2::new(
        f32::from(intent.horizontal()),
        f32::from(intent.vertical()),
    );
    if direction.x != 0.0 && direction.y != 0.0 {
        direction *= std::f32::consts::FRAC_1_SQRT_2;
    }
    direction * speed * dt.as_secs_f32()
}

/// Horizontal input wins the facing; without input the player keeps facing.
fn facing_for(intent: MovementIntent, current: Direction) -> Direction {
    match (intent.horizontal(), intent.vertical()) {
        (h, _) if h > 0 => Direction::East,
        (h, _) if h < 0 => Direction::West,
        (_, v) if v > 0 => Direction::South,
        (_, v) if v < 0 => Direction::North,
        _ => current,
    }
}

/// Jump timers: airtime, landing cooldown and a buffered early press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct JumpState {
    airborne: Option<Duration>,
    cooldown: Duration,
    buffered: Option<Duration>,
}

impl JumpState {
    /// Advances the timers by `dt`, registers a press and reports whether the player is airborne.
    fn update(&mut self, dt: Duration, pressed: bool, config: &PlayerConfig) -> bool {
        if let Some(remaining) = self.airborne {
            let remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                self.airborne = None;
                self.cooldown = config.jump_cooldown();
            } else {
                self.airborne = Some(remaining);
            }
        } else {
            self.cooldown = self.cooldown.saturating_sub(dt);
        }
        self.buffered = self
            .buffered
            .map(|remaining| remaining.saturating_sub(dt))
            .filter(|remaining| !remaining.is_zero());

        if pressed {
            self.buffered = Some(config.jump_buffer());
        }
        if self.buffered.is_some() && self.can_jump() {
            self.buffered = None;
            self.airborne = Some(config.jump_duration());
        }
        self.airborne.is_some()
    }

    fn can_jump(&self) -> bool {
        self.airborne.is_none() && self.cooldown.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn diagonal_input_is_normalised() {
        let intent = MovementIntent {
            right: true,
            down: true,
            ..MovementIntent::default()
        };
        let delta = step_delta(intent, 120.0, ms(500));
        assert!((delta.length() - 60.0).abs() < 1e-3);
        assert!((delta.x - delta.y).abs() < 1e-6);

        let straight = step_delta(
            MovementIntent {
                left: true,
                ..MovementIntent::default()
            },
            120.0,
            ms(500),
        );
        assert_eq!(straight, Vec2::new(-60.0, 0.0));
    }

    #[test]
    fn opposite_keys_cancel() {
        let intent = MovementIntent {
            left: true,
            right: true,
            ..MovementIntent::default()
        };
        assert_eq!(step_delta(intent, 120.0, ms(100)), Vec2::ZERO);
        assert_eq!(facing_for(intent, Direction::North), Direction::North);
    }

    #[test]
    fn horizontal_input_decides_facing() {
        let intent = MovementIntent {
            left: true,
            up: true,
            ..MovementIntent::default()
        };
        assert_eq!(facing_for(intent, Direction::South), Direction::West);
        let up = MovementIntent {
            up: true,
            ..MovementIntent::default()
        };
        assert_eq!(facing_for(up, Direction::South), Direction::North);
    }

    #[test]
    fn jump_lasts_its_duration_then_cools_down() {
        let config = PlayerConfig::default();
        let mut jump = JumpState::default();
        assert!(jump.update(ms(0), true, &config));
        for _ in 0..7 {
            assert!(jump.update(ms(50), false, &config));
        }
        assert!(!jump.update(ms(50), false, &config));
        assert!(!jump.can_jump());
        assert!(!jump.update(ms(150), false, &config));
        assert!(jump.can_jump());
    }

    #[test]
    fn press_during_cooldown_is_buffered() {
        let config = PlayerConfig::default();
        let mut jump = JumpState::default();
        assert!(jump.update(ms(0), true, &config));
        assert!(!jump.update(ms(400), false, &config));

        assert!(!jump.update(ms(50), true, &config));
        assert!(!jump.update(ms(50), false, &config));
        assert!(jump.update(ms(50), false, &config));
    }

    #[test]
    fn buffered_press_expires() {
        let config = PlayerConfig::default();
        let mut jump = JumpState::default();
        assert!(jump.update(ms(0), true, &config));
        assert!(jump.update(ms(100), true, &config));
        assert!(jump.update(ms(100), false, &config));
        assert!(jump.update(ms(100), false, &config));
        assert!(!jump.update(ms(100), false, &config));
        assert!(!jump.update(ms(200), false, &config));
        assert!(jump.can_jump());
        assert_eq!(jump.buffered, None);
    }
}
