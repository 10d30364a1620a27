//! Reachability and shortest-path queries over 4-connected open cells.

use std::collections::VecDeque;

use grove_maze_core::{CellCoord, CellState, Grid};

use crate::priority_queue::PriorityQueue;

/// Dense breadth-first distance grid seeded from one or more source cells.
///
/// Distances default to `u32::MAX` for unreachable cells so callers can
/// distinguish blocked or isolated cells from traversable ones.
#[derive(Clone, Debug, Default)]
pub(crate) struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Rebuilds the distances using a breadth-first search from `sources`.
    pub(crate) fn rebuild_with<F>(
        &mut self,
        width: u32,
        height: u32,
        sources: &[CellCoord],
        mut is_open: F,
    ) where
        F: FnMut(CellCoord) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;
        if cell_count == 0 {
            self.distances.clear();
            return;
        }

        if self.distances.len() != cell_count {
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }

        let mut queue = VecDeque::new();
        for &source in sources {
            if source.column() >= width || source.row() >= height || !is_open(source) {
                continue;
            }
            if let Some(slot) = index(width_usize, source).and_then(|i| self.distances.get_mut(i))
            {
                if *slot == 0 {
                    continue;
                }
                *slot = 0;
                queue.push_back(source);
            }
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current) = index(width_usize, cell).and_then(|i| self.distances.get(i).copied())
            else {
                continue;
            };
            let next_distance = current.saturating_add(1);

            for neighbor in neighbors(cell, width, height) {
                if !is_open(neighbor) {
                    continue;
                }
                let Some(slot) =
                    index(width_usize, neighbor).and_then(|i| self.distances.get_mut(i))
                else {
                    continue;
                };
                if *slot <= next_distance {
                    continue;
                }
                *slot = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the cell, or `None` when unreachable or outside the field.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> Option<u32> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        index(width, cell)
            .and_then(|offset| self.distances.get(offset).copied())
            .filter(|distance| *distance != u32::MAX)
    }
}

/// Length in steps of the shortest 4-connected path from `start` to `goal`.
///
/// Runs an A* search with a Manhattan heuristic and uniform step cost over the
/// cells accepted by `is_open`. Returns `None` when no path exists.
pub fn shortest_path_length<F>(
    width: u32,
    height: u32,
    start: CellCoord,
    goal: CellCoord,
    is_open: F,
) -> Option<u32>
where
    F: Fn(CellCoord) -> bool,
{
    let width_usize = usize::try_from(width).ok()?;
    let height_usize = usize::try_from(height).ok()?;
    let cell_count = width_usize.checked_mul(height_usize)?;
    if start.column() >= width || start.row() >= height || !is_open(start) || !is_open(goal) {
        return None;
    }

    let mut best = vec![u32::MAX; cell_count];
    let mut closed = vec![false; cell_count];
    let mut queue = PriorityQueue::new();

    *best.get_mut(index(width_usize, start)?)? = 0;
    queue.enqueue(start, start.manhattan_distance(goal));

    while let Some(cell) = queue.dequeue() {
        let current_index = index(width_usize, cell)?;
        let current = *best.get(current_index)?;
        if cell == goal {
            return Some(current);
        }
        let visited = closed.get_mut(current_index)?;
        if *visited {
            continue;
        }
        *visited = true;

        let next = current.saturating_add(1);
        for neighbor in neighbors(cell, width, height) {
            if !is_open(neighbor) {
                continue;
            }
            let neighbor_index = index(width_usize, neighbor)?;
            let slot = best.get_mut(neighbor_index)?;
            if next < *slot {
                *slot = next;
                queue.enqueue(neighbor, next + neighbor.manhattan_distance(goal));
            }
        }
    }

    None
}

/// Shortest Floor path between two cells of the grid.
#[must_use]
pub fn floor_path_length(grid: &Grid, start: CellCoord, goal: CellCoord) -> Option<u32> {
    shortest_path_length(grid.columns(), grid.rows(), start, goal, |cell| {
        grid.is(cell, CellState::Floor)
    })
}

/// Reports whether `goal` can be reached from `start` over Floor cells.
#[must_use]
pub fn is_reachable(grid: &Grid, start: CellCoord, goal: CellCoord) -> bool {
    let mut field = DistanceField::default();
    field.rebuild_with(grid.columns(), grid.rows(), &[start], |cell| {
        grid.is(cell, CellState::Floor)
    });
    field.distance(goal).is_some()
}

pub(crate) fn neighbors(
    cell: CellCoord,
    width: u32,
    height: u32,
) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
