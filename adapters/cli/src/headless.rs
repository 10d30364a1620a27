use std::collections::HashSet;

use grove_maze_core::{CellCoord, CellState, GenerationReport, Level, TreeKind};
use grove_maze_system_level_generation::is_reachable;

/// Renders the level as one line of characters per grid row.
///
/// `E` entrance, `X` exit, `#` tree, `A` apple tree, `~` pond, `*` flower,
/// `,` leaf and `.` bare floor.
pub(crate) fn render_ascii(level: &Level) -> String {
    let grid = level.grid();
    let flowers: HashSet<CellCoord> = level.flowers().iter().map(|flower| flower.cell).collect();
    let leaves: HashSet<CellCoord> = level.leaves().iter().map(|leaf| leaf.cell).collect();

    let mut map = String::with_capacity(((grid.columns() + 1) * grid.rows()) as usize);
    for row in 0..grid.rows() {
        for column in 0..grid.columns() {
            let cell = CellCoord::new(column, row);
            let glyph = if cell == level.entrance() {
                'E'
            } else if cell == level.exit() {
                'X'
            } else {
                match grid.get(cell) {
                    Some(CellState::Wall) => match level.tree_kinds().kind(cell) {
                        TreeKind::Normal => '#',
                        TreeKind::Apple => 'A',
                    },
                    Some(CellState::Pond) => '~',
                    Some(CellState::Floor) if flowers.contains(&cell) => '*',
                    Some(CellState::Floor) if leaves.contains(&cell) => ',',
                    Some(CellState::Floor) | None => '.',
                }
            };
            map.push(glyph);
        }
        map.push('\n');
    }
    map
}

/// Single-line summary of how the level was generated.
pub(crate) fn describe_report(report: &GenerationReport) -> String {
    let path = report
        .path_length
        .map_or_else(|| "none".to_owned(), |length| length.to_string());
    format!(
        "seed={} path={path}/{} exit_attempts={} fallback_corridor={} degraded={} ponds_rejected={}",
        report.seed,
        report.required_path_length,
        report.exit_attempts,
        report.fallback_corridor,
        report.exit_degraded,
        report.ponds_rejected_for_connectivity,
    )
}

/// Lists every structural guarantee the level violates.
///
/// A degraded exit is reported by the generator itself and is not a violation.
pub(crate) fn validate_level(level: &Level) -> Vec<String> {
    let grid = level.grid();
    let entrance = level.entrance();
    let exit = level.exit();
    let mut problems = Vec::new();

    if entrance == exit {
        problems.push(format!("entrance and exit share cell {entrance:?}"));
    }
    for (name, cell) in [("entrance", entrance), ("exit", exit)] {
        if !grid.is_border_edge(cell) {
            problems.push(format!("{name} {cell:?} is not a non-corner border cell"));
        }
        if !grid.is(cell, CellState::Floor) {
            problems.push(format!("{name} {cell:?} is not floor"));
        }
    }

    let breaches = grid
        .iter()
        .filter(|(cell, state)| {
            grid.is_border(*cell) && *cell != entrance && *cell != exit && *state != CellState::Wall
        })
        .count();
    if breaches > 0 {
        problems.push(format!("{breaches} border cells are open"));
    }

    if !is_reachable(grid, entrance, exit) {
        problems.push("exit is unreachable from the entrance".to_owned());
    }

    let report = level.report();
    if !report.exit_degraded && !report.meets_path_requirement() {
        problems.push(format!(
            "path length {:?} is below {} without a degraded flag",
            report.path_length, report.required_path_length
        ));
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_maze_core::{Flower, FlowerKind, Grid, Leaf, LeafPattern, LevelParts, TreeKinds};

    fn corridor(open_border: bool) -> Level {
        let mut grid = Grid::filled(7, 7, CellState::Wall);
        for column in 0..7 {
            grid.set(CellCoord::new(column, 3), CellState::Floor);
        }
        grid.set(CellCoord::new(3, 2), CellState::Pond);
        if open_border {
            grid.set(CellCoord::new(3, 0), CellState::Floor);
        }
        let mut kinds = vec![TreeKind::Normal; 49];
        kinds[1] = TreeKind::Apple;
        Level::new(LevelParts {
            grid,
            tree_kinds: TreeKinds::from_row_major(7, kinds),
            flowers: vec![Flower {
                cell: CellCoord::new(2, 3),
                kind: FlowerKind::Red,
            }],
            ponds: Vec::new(),
            leaves: vec![Leaf {
                cell: CellCoord::new(4, 3),
                pattern: LeafPattern::B,
            }],
            clearings: Vec::new(),
            entrance: CellCoord::new(0, 3),
            exit: CellCoord::new(6, 3),
            report: GenerationReport {
                seed: 9,
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
    fn ascii_map_marks_every_feature() {
        let map = render_ascii(&corridor(false));
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], "#A#####");
        assert_eq!(rows[2], "###~###");
        assert_eq!(rows[3], "E.*.,.X");
    }

    #[test]
    fn report_summary_lists_path_and_flags() {
        let summary = describe_report(corridor(false).report());
        assert!(summary.starts_with("seed=9 path=6/6"));
        assert!(summary.contains("degraded=false"));
    }

    #[test]
    fn sound_level_has_no_problems() {
        assert!(validate_level(&corridor(false)).is_empty());
    }

    #[test]
    fn open_border_is_a_problem() {
        let problems = validate_level(&corridor(true));
        assert_eq!(problems, vec!["1 border cells are open".to_owned()]);
    }
}
