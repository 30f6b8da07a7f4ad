/// Tile kinds and the grid query surface.
/// Raw map cells are (column, row) indices into the tileset image; their
/// meaning is decoded here once, so tile semantics are centralized.

/// Edge length of one tile in pixels.
pub const TILE_SIZE: i32 = 8;

/// Raw tileset column at or above which a tile is solid.
pub const WALL_THRESHOLD: u8 = 4;

/// A tileset cell reference as stored in the map.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RawTile {
    pub u: u8,
    pub v: u8,
}

impl RawTile {
    pub const EMPTY: RawTile = RawTile { u: 0, v: 0 };
    pub const FLOOR: RawTile = RawTile { u: 1, v: 0 };
    pub const SPAWN1: RawTile = RawTile { u: 0, v: 1 };
    pub const SPAWN2: RawTile = RawTile { u: 1, v: 1 };
    pub const SPAWN3: RawTile = RawTile { u: 2, v: 1 };
    pub const GOAL: RawTile = RawTile { u: 0, v: 8 };
    pub const WALL: RawTile = RawTile { u: 4, v: 0 };
    pub const WALL_ALT: RawTile = RawTile { u: 5, v: 0 };
    pub const MALFORMED: RawTile = RawTile { u: 3, v: 1 };

    pub const fn new(u: u8, v: u8) -> Self {
        RawTile { u, v }
    }

    /// Text-map legend:
    ///   ' ' '.' = Empty        '=' = Floor (one-way)
    ///   '#' '%' = Wall         '1' '2' '3' = enemy spawn markers
    ///   'G' = Goal marker      '?' = broken marker (never spawns)
    pub fn from_glyph(ch: char) -> Option<RawTile> {
        match ch {
            ' ' | '.' => Some(RawTile::EMPTY),
            '=' => Some(RawTile::FLOOR),
            '#' => Some(RawTile::WALL),
            '%' => Some(RawTile::WALL_ALT),
            '1' => Some(RawTile::SPAWN1),
            '2' => Some(RawTile::SPAWN2),
            '3' => Some(RawTile::SPAWN3),
            'G' => Some(RawTile::GOAL),
            '?' => Some(RawTile::MALFORMED),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Empty,
    Floor,        // one-way platform
    Spawn(u8),    // enemy variant 1..=3
    GoalMarker,
    Wall,
}

impl TileKind {
    /// Decode a raw cell. Anything unrecognized below the wall threshold
    /// (including malformed markers) is Empty.
    pub fn decode(raw: RawTile) -> TileKind {
        if raw.u >= WALL_THRESHOLD {
            return TileKind::Wall;
        }
        match raw {
            RawTile::FLOOR => TileKind::Floor,
            RawTile::SPAWN1 => TileKind::Spawn(1),
            RawTile::SPAWN2 => TileKind::Spawn(2),
            RawTile::SPAWN3 => TileKind::Spawn(3),
            RawTile::GOAL => TileKind::GoalMarker,
            _ => TileKind::Empty,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, TileKind::Wall)
    }

    /// Floor or Wall: something an enemy can stand on or bump into.
    pub fn is_solid_ground(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Wall)
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Empty
    }
}

/// Read-only tile lookup by tile coordinate.
/// Out-of-range coordinates must answer `Empty` so collision stays total.
pub trait TileGrid {
    fn tile_at(&self, col: i32, row: i32) -> TileKind;
}

/// A loaded stage map.
#[derive(Clone, Debug, Default)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    cells: Vec<Vec<RawTile>>,
}

impl TileMap {
    pub fn new(cells: Vec<Vec<RawTile>>) -> Self {
        let height = cells.len();
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0);
        TileMap { width, height, cells }
    }

    /// Build a map from legend rows. Unknown glyphs become Empty.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let cells = rows
            .iter()
            .map(|row| {
                row.as_ref()
                    .chars()
                    .map(|c| RawTile::from_glyph(c).unwrap_or(RawTile::EMPTY))
                    .collect()
            })
            .collect();
        TileMap::new(cells)
    }

    pub fn raw_at(&self, col: i32, row: i32) -> RawTile {
        if col < 0 || row < 0 {
            return RawTile::EMPTY;
        }
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
            .unwrap_or(RawTile::EMPTY)
    }

    /// Map width in pixels.
    pub fn pixel_width(&self) -> i32 {
        self.width as i32 * TILE_SIZE
    }
}

impl TileGrid for TileMap {
    #[inline]
    fn tile_at(&self, col: i32, row: i32) -> TileKind {
        TileKind::decode(self.raw_at(col, row))
    }
}
