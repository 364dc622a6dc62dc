use crate::map::GridMap;

/// Number of discrete headings. 0 = north, then clockwise.
pub const DIRECTIONS: f32 = 4.0;

// Ray-march resolution for proximity detection, in cell units.
const DETECT_STEP: f32 = 0.02;

/// A body moving continuously over the grid.
///
/// Position is in cell units (cell `(i, j)` spans `[i, i+1) x [j, j+1)`) and
/// `dir` is a continuous heading in `[0, DIRECTIONS)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub dir: f32,
}

impl Body {
    /// Place the body at the centre of cell `(x, y)`.
    pub fn at_cell(x: i32, y: i32, dir: f32) -> Self {
        Self {
            x: x as f32 + 0.5,
            y: y as f32 + 0.5,
            dir: dir.rem_euclid(DIRECTIONS),
        }
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn turn(&mut self, delta: f32) {
        self.dir = (self.dir + delta).rem_euclid(DIRECTIONS);
    }

    /// Move along the current heading. Returns false (and stays put) if the
    /// destination lies inside a wall.
    pub fn go_forward(&mut self, distance: f32, map: &GridMap) -> bool {
        let (dx, dy) = heading_vector(self.dir);
        let nx = self.x + dx * distance;
        let ny = self.y + dy * distance;
        if map.is_wall(nx.floor() as i32, ny.floor() as i32) {
            return false;
        }
        self.x = nx;
        self.y = ny;
        true
    }

    /// Distance to the first wall along heading `dir`, capped at `max_distance`.
    pub fn detect(&self, dir: f32, max_distance: f32, map: &GridMap) -> f32 {
        let (dx, dy) = heading_vector(dir);
        let mut d = 0.0;
        while d < max_distance {
            let px = self.x + dx * d;
            let py = self.y + dy * d;
            if map.is_wall(px.floor() as i32, py.floor() as i32) {
                return d;
            }
            d += DETECT_STEP;
        }
        max_distance
    }

    /// The grid direction the body is facing, for neighbour lookups.
    pub fn grid_dir(&self) -> u32 {
        (self.dir.floor() as u32) % DIRECTIONS as u32
    }
}

fn heading_vector(dir: f32) -> (f32, f32) {
    let theta = dir * 2.0 * core::f32::consts::PI / DIRECTIONS;
    (theta.sin(), -theta.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> GridMap {
        GridMap::parse("#######\n#     #\n#######").unwrap()
    }

    #[test]
    fn forward_motion_stops_at_walls() {
        let map = corridor();
        let mut body = Body::at_cell(1, 1, 1.0); // east
        assert!(body.go_forward(1.0, &map));
        assert_eq!(body.cell(), (2, 1));

        body.turn(-1.0); // north, straight into the wall
        assert!(!body.go_forward(1.0, &map));
        assert_eq!(body.cell(), (2, 1));
    }

    #[test]
    fn heading_wraps() {
        let mut body = Body::at_cell(1, 1, 3.5);
        body.turn(1.0);
        assert!((body.dir - 0.5).abs() < 1e-5);
        body.turn(-1.0);
        assert!((body.dir - 3.5).abs() < 1e-5);
    }

    #[test]
    fn detect_measures_corridor() {
        let map = corridor();
        let body = Body::at_cell(1, 1, 1.0);
        let east = body.detect(1.0, 10.0, &map);
        // From x=1.5 to the wall at x=6.
        assert!((east - 4.5).abs() < 0.05, "east={east}");
        let north = body.detect(0.0, 10.0, &map);
        assert!((north - 0.5).abs() < 0.05, "north={north}");
        let capped = body.detect(1.0, 2.0, &map);
        assert_eq!(capped, 2.0);
    }
}
