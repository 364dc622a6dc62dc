#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The map the critter explores by default.
///
/// `#` marks walls and `G R B M Y` mark coloured cells; everything else is
/// background.
pub const DEFAULT_MAP: &str = "
#########
#  M   R#
#R#R#B#R#
# # # # #
#G Y   R#
#########
";

/// Colour index of background (white) cells.
pub const BACKGROUND: u8 = 0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,
    #[error("map has no open cell")]
    NoOpenCell,
    #[error("cell ({x}, {y}) is a wall")]
    BlockedStart { x: i32, y: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    pub wall: bool,
    /// 0 = background, 1..=5 = green, red, blue, magenta, yellow.
    pub colour: u8,
}

impl Cell {
    const WALL: Cell = Cell {
        wall: true,
        colour: BACKGROUND,
    };

    fn from_char(ch: char) -> Self {
        let colour = match ch {
            'G' => 1,
            'R' => 2,
            'B' => 3,
            'M' => 4,
            'Y' => 5,
            _ => BACKGROUND,
        };
        Cell {
            wall: ch == '#',
            colour,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridMap {
    w: usize,
    h: usize,
    cells: Vec<Cell>,
}

impl GridMap {
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut rows: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        while rows.first().is_some_and(|r| r.is_empty()) {
            rows.remove(0);
        }
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        if rows.is_empty() {
            return Err(MapError::Empty);
        }

        let w = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let h = rows.len();
        let mut cells = Vec::with_capacity(w * h);
        for row in &rows {
            let mut n = 0;
            for ch in row.chars() {
                cells.push(Cell::from_char(ch));
                n += 1;
            }
            // Ragged rows are closed off so nothing can walk off the edge.
            cells.extend(std::iter::repeat(Cell::WALL).take(w - n));
        }

        if cells.iter().all(|c| c.wall) {
            return Err(MapError::NoOpenCell);
        }

        Ok(Self { w, h, cells })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Out-of-bounds coordinates read as walls.
    pub fn cell(&self, x: i32, y: i32) -> Cell {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return Cell::WALL;
        }
        self.cells[(y as usize) * self.w + (x as usize)]
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).wall
    }

    pub fn colour_at(&self, x: i32, y: i32) -> u8 {
        self.cell(x, y).colour
    }

    pub fn count_colour(&self, colour: u8) -> usize {
        self.cells
            .iter()
            .filter(|c| !c.wall && c.colour == colour)
            .count()
    }
}

/// Unit step towards the neighbour in one of the four grid directions
/// (0 = north, clockwise).
pub fn neighbour_offset(dir: u32) -> (i32, i32) {
    match dir % 4 {
        0 => (0, -1),
        1 => (1, 0),
        2 => (0, 1),
        _ => (-1, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_parses() {
        let map = GridMap::parse(DEFAULT_MAP).unwrap();
        assert_eq!(map.width(), 9);
        assert_eq!(map.height(), 6);
        assert!(map.is_wall(0, 0));
        assert_eq!(map.colour_at(3, 1), 4); // M
        assert_eq!(map.colour_at(1, 4), 1); // G
        assert_eq!(map.count_colour(2), 5); // R
        assert!(!map.is_wall(1, 2));
        assert_eq!(map.colour_at(1, 2), 2);
    }

    #[test]
    fn ragged_rows_are_walled_off() {
        let map = GridMap::parse("###\n#\n###").unwrap_err();
        assert_eq!(map, MapError::NoOpenCell);

        let map = GridMap::parse("####\n# R\n####").unwrap();
        assert!(map.is_wall(3, 1));
        assert_eq!(map.colour_at(2, 1), 2);
    }

    #[test]
    fn out_of_bounds_is_wall() {
        let map = GridMap::parse("   ").unwrap();
        assert!(map.is_wall(-1, 0));
        assert!(map.is_wall(0, 1));
        assert!(!map.is_wall(2, 0));
    }

    #[test]
    fn empty_map_is_rejected() {
        assert_eq!(GridMap::parse("\n\n").unwrap_err(), MapError::Empty);
    }
}
