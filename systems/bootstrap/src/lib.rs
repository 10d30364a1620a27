#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Grove Maze experience.

use grove_maze_core::Level;
use grove_maze_world::{query, World};

/// Produces data required to greet the player and label the current level.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the active level for presentation purposes.
    #[must_use]
    pub fn level<'world>(&self, world: &'world World) -> Option<&'world Level> {
        query::level(world)
    }

    /// Level counter shown in the corner of the screen.
    #[must_use]
    pub fn level_label(&self, world: &World) -> Option<String> {
        query::level(world).map(|_| format!("Level {}", query::level_number(world)))
    }

    /// Two-line message displayed while the next level is being prepared.
    #[must_use]
    pub fn transition_message(&self, world: &World) -> Option<[String; 2]> {
        if query::transition_remaining(world).is_none() {
            return None;
        }
        let number = query::level_number(world);
        Some([
            format!("Level {number} complete!"),
            format!("Preparing level {}...", number.saturating_add(1)),
        ])
    }
}
