#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural level generation for Grove Maze.
//!
//! A level is built in stages that share a single seeded random stream: the
//! maze carver produces the wall/floor grid together with an entrance and an
//! exit separated by a minimum path length, the pond stage turns organic blobs
//! of floor into water without cutting that path, and the decoration stages
//! scatter flowers and leaves without touching cell states.
//!
//! [`LevelGeneration`] wraps the pipeline as a pure system: it reacts to
//! [`Event::LevelRequested`] and answers with [`Command::InstallLevel`].

mod leaves;
mod level;
mod maze;
mod navigation;
mod ponds;
mod priority_queue;

use grove_maze_core::{Command, Event, GameConfig};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

pub use leaves::LeafGenerator;
pub use level::{LevelError, LevelGenerator};
pub use maze::{remove_dead_ends, MazeGenerator, MazeLayout};
pub use navigation::{floor_path_length, is_reachable, shortest_path_length};
pub use ponds::{PondGenerator, PondPlacement};
pub use priority_queue::PriorityQueue;

/// Pure system that answers level requests with freshly generated levels.
#[derive(Debug)]
pub struct LevelGeneration {
    generator: LevelGenerator,
    seeds: ChaCha8Rng,
}

impl LevelGeneration {
    /// Creates the system; every level draws its own seed from `seed`.
    pub fn new(config: &GameConfig, seed: u64) -> Result<Self, LevelError> {
        Ok(Self {
            generator: LevelGenerator::new(config)?,
            seeds: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Generator used to build levels.
    #[must_use]
    pub fn generator(&self) -> &LevelGenerator {
        &self.generator
    }

    /// Consumes world events and emits commands installing requested levels.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            let Event::LevelRequested { number, entrance } = event else {
                continue;
            };
            let seed = self.seeds.next_u64();
            let level = match self.generator.generate(*entrance, seed) {
                Ok(level) => level,
                Err(error) => {
                    warn!(number, %error, "requested entrance rejected, drawing a random one");
                    match self.generator.generate(None, seed) {
                        Ok(level) => level,
                        Err(error) => {
                            warn!(number, %error, "level generation failed");
                            continue;
                        }
                    }
                }
            };
            out.push(Command::InstallLevel {
                level: Box::new(level),
            });
        }
    }
}
