//! Tile grid consumed by every placement search and movement check.

use std::collections::BTreeSet;

use rand::Rng;
use rune_hall_core::{CellCoord, PixelPoint};
use thiserror::Error;

/// Glyph marking a collidable tile in text layouts.
const WALL_GLYPH: char = '#';
/// Glyph marking a walkable tile in text layouts.
const FLOOR_GLYPH: char = '.';

/// Immutable tile description shared by every cell with the same appearance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    collidable: bool,
}

impl Tile {
    /// Walkable floor.
    pub const FLOOR: Tile = Tile::new(false);
    /// Solid wall.
    pub const WALL: Tile = Tile::new(true);

    /// Creates a tile with the provided collision flag.
    #[must_use]
    pub const fn new(collidable: bool) -> Self {
        Self { collidable }
    }

    /// Reports whether entities are blocked by the tile.
    #[must_use]
    pub const fn is_collidable(&self) -> bool {
        self.collidable
    }
}

/// Errors raised while building a collision map from a text layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contained no rows or only empty rows.
    #[error("layout is empty")]
    Empty,
    /// Rows of the layout differ in width.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The layout contained a glyph other than `#` or `.`.
    #[error("unexpected glyph `{glyph}` at column {column}, row {row}")]
    UnknownGlyph {
        /// Glyph that could not be interpreted.
        glyph: char,
        /// Zero-based column of the glyph.
        column: usize,
        /// Zero-based row of the glyph.
        row: usize,
    },
}

/// Dense grid of tiles answering collision queries for a single hall.
///
/// Cells store an index into a small palette so identical tiles are shared.
/// Cells outside the grid are treated as collidable.
#[derive(Clone, Debug)]
pub struct CollisionMap {
    columns: u32,
    rows: u32,
    tile_length: f32,
    palette: Vec<Tile>,
    cells: Vec<usize>,
    transparent: BTreeSet<CellCoord>,
}

impl CollisionMap {
    /// Creates a grid where every tile is walkable floor.
    #[must_use]
    pub fn open(columns: u32, rows: u32, tile_length: f32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            tile_length,
            palette: vec![Tile::FLOOR],
            cells: vec![0; capacity],
            transparent: BTreeSet::new(),
        }
    }

    /// Creates a grid of floor tiles enclosed by a one-tile wall border.
    #[must_use]
    pub fn walled(columns: u32, rows: u32, tile_length: f32) -> Self {
        let mut map = Self::open(columns, rows, tile_length);
        for row in 0..rows {
            for column in 0..columns {
                if row == 0 || column == 0 || row + 1 == rows || column + 1 == columns {
                    map.set_tile(CellCoord::new(column, row), Tile::WALL);
                }
            }
        }
        map
    }

    /// Parses a layout of `#` (wall) and `.` (floor) rows.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_length: f32) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = rows
            .iter()
            .map(|row| row.as_ref().trim_end())
            .filter(|row| !row.is_empty())
            .collect();
        let expected = lines.first().map_or(0, |line| line.chars().count());
        if expected == 0 {
            return Err(LayoutError::Empty);
        }

        let columns = u32::try_from(expected).map_err(|_| LayoutError::Empty)?;
        let row_count = u32::try_from(lines.len()).map_err(|_| LayoutError::Empty)?;
        let mut map = Self::open(columns, row_count, tile_length);

        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(LayoutError::Ragged {
                    row,
                    expected,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                let tile = match glyph {
                    WALL_GLYPH => Tile::WALL,
                    FLOOR_GLYPH => Tile::FLOOR,
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            column,
                            row,
                        })
                    }
                };
                // Both indices are bounded by `columns` and `row_count`.
                map.set_tile(CellCoord::new(column as u32, row as u32), tile);
            }
        }

        Ok(map)
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a tile in pixels.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Replaces the tile stored at `cell`. Cells outside the grid are ignored.
    pub fn set_tile(&mut self, cell: CellCoord, tile: Tile) {
        let Some(index) = self.index(cell) else {
            return;
        };
        let palette_index = match self.palette.iter().position(|known| *known == tile) {
            Some(position) => position,
            None => {
                self.palette.push(tile);
                self.palette.len() - 1
            }
        };
        self.cells[index] = palette_index;
    }

    /// Tile stored at `cell`, if the cell lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .and_then(|palette_index| self.palette.get(*palette_index))
            .copied()
    }

    /// Reports whether the tile at `column`, `row` blocks movement.
    #[must_use]
    pub fn is_collidable(&self, column: u32, row: u32) -> bool {
        self.is_cell_collidable(CellCoord::new(column, row))
    }

    /// Reports whether `cell` blocks movement. Out-of-bounds cells always do.
    #[must_use]
    pub fn is_cell_collidable(&self, cell: CellCoord) -> bool {
        self.tile(cell).map_or(true, |tile| tile.is_collidable())
    }

    /// Reports whether the tile containing `point` blocks movement.
    #[must_use]
    pub fn is_point_collidable(&self, point: PixelPoint) -> bool {
        self.cell_at(point)
            .map_or(true, |cell| self.is_cell_collidable(cell))
    }

    /// Cell containing `point`, if the point lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, point: PixelPoint) -> Option<CellCoord> {
        CellCoord::containing(point, self.tile_length).filter(|cell| self.contains(*cell))
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Marks a cell as rendered see-through while a wizard stands on it.
    pub fn mark_transparent(&mut self, cell: CellCoord) {
        if self.contains(cell) {
            let _ = self.transparent.insert(cell);
        }
    }

    /// Reverts a see-through cell to its normal appearance.
    ///
    /// Returns `true` when the cell was transparent.
    pub fn clear_transparent(&mut self, cell: CellCoord) -> bool {
        self.transparent.remove(&cell)
    }

    /// Reports whether a cell currently renders see-through.
    #[must_use]
    pub fn is_transparent(&self, cell: CellCoord) -> bool {
        self.transparent.contains(&cell)
    }

    /// Iterator over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Draws up to `attempts` random cells and returns the first walkable one `accept` approves.
    ///
    /// Gives up silently after the attempt budget; callers treat `None` as
    /// "nothing happened this tick".
    pub fn find_open_cell<R, F>(
        &self,
        rng: &mut R,
        attempts: usize,
        mut accept: F,
    ) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
        F: FnMut(CellCoord) -> bool,
    {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        for _ in 0..attempts {
            let cell = CellCoord::new(rng.gen_range(0..self.columns), rng.gen_range(0..self.rows));
            if !self.is_cell_collidable(cell) && accept(cell) {
                return Some(cell);
            }
        }
        None
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
