//! Breadth-first route planner used when the world is built.

use std::collections::VecDeque;

use corridor_defence_core::{CellCoord, Grid, LayoutError, Path};

/// Computes the shortest open route from `start` to `end`.
///
/// Neighbours are explored west, south, east, north so that ties between equal
/// length routes always resolve to the same path. The search stops as soon as
/// `end` is dequeued.
pub(crate) fn find_path(
    grid: &Grid,
    start: CellCoord,
    end: CellCoord,
) -> Result<Path, LayoutError> {
    for cell in [start, end] {
        if !grid.contains(cell) {
            return Err(LayoutError::OutOfBounds { cell });
        }
    }

    if !grid.is_open(start) {
        return Err(LayoutError::BlockedStart { cell: start });
    }

    if start == end {
        return Path::new(vec![start]);
    }

    let width = usize::try_from(grid.width()).map_err(|_| LayoutError::GridTooLarge)?;
    let height = usize::try_from(grid.height()).map_err(|_| LayoutError::GridTooLarge)?;
    let cell_count = width
        .checked_mul(height)
        .ok_or(LayoutError::GridTooLarge)?;

    let mut parents: Vec<Option<CellCoord>> = vec![None; cell_count];
    let mut discovered = vec![false; cell_count];
    if let Some(index) = grid.index(start) {
        discovered[index] = true;
    }

    let mut queue = VecDeque::from([start]);
    let mut reached = false;

    while let Some(cell) = queue.pop_front() {
        if cell == end {
            reached = true;
            break;
        }

        for neighbor in neighbors(cell, grid.width(), grid.height()) {
            if !grid.is_open(neighbor) {
                continue;
            }

            let Some(index) = grid.index(neighbor) else {
                continue;
            };

            if discovered[index] {
                continue;
            }

            discovered[index] = true;
            parents[index] = Some(cell);
            queue.push_back(neighbor);
        }
    }

    if !reached {
        return Err(LayoutError::Unreachable { start, end });
    }

    let mut cells = vec![end];
    let mut current = end;
    while current != start {
        let Some(parent) = grid.index(current).and_then(|index| parents[index]) else {
            return Err(LayoutError::Unreachable { start, end });
        };
        cells.push(parent);
        current = parent;
    }
    cells.reverse();

    Path::new(cells)
}

fn neighbors(cell: CellCoord, width: u32, height: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(x) = cell.x().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(x, cell.y()));
        count += 1;
    }

    if let Some(y) = cell.y().checked_add(1) {
        if y < height {
            candidates[count] = Some(CellCoord::new(cell.x(), y));
            count += 1;
        }
    }

    if let Some(x) = cell.x().checked_add(1) {
        if x < width {
            candidates[count] = Some(CellCoord::new(x, cell.y()));
            count += 1;
        }
    }

    if let Some(y) = cell.y().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.x(), y));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
