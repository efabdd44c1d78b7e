//! Tile Grid Parser
//!
//! Turns a padded text grid into typed geometry: solids, trigger regions,
//! coin centres and spawn anchors. Scanning is row-major, so every list
//! (and the combined solid list) is ordered top-to-bottom, left-to-right.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::fixed::{Fixed, from_int, LEVEL_HEADROOM, MAX_PIXEL};
use crate::core::geom::{Point, Rect};
use crate::core::hash::{StateHash, hash_grid};

/// Why a level document could not become a `ParsedLevel`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid JSON (or a field has the wrong type)
    #[error("malformed level document: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level field is absent
    #[error("level document is missing required field `{0}`")]
    MissingField(&'static str),

    /// `tile_size` is zero or negative
    #[error("tile_size must be a positive integer, got {0}")]
    InvalidTileSize(i64),

    /// The level's pixel extent does not fit the fixed-point range
    #[error("level of {width}x{height} tiles is too large for its tile size")]
    LevelTooLarge { width: usize, height: usize },

    /// No `P` tile in the grid
    #[error("level has no player spawn (`P`) tile")]
    MissingSpawn,

    /// No `G` tile in the grid
    #[error("level has no goal (`G`) tile")]
    MissingGoal,
}

/// One cell of the tile vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    /// `.`
    Empty,
    /// `#` solid ground
    Platform,
    /// `S` solid, drawn differently from platforms
    Stone,
    /// `_` instant fall hazard
    Pit,
    /// `C` collectible
    Coin,
    /// `E` patrol enemy anchor
    Enemy,
    /// `P` player spawn anchor
    Spawn,
    /// `G` level exit
    Goal,
}

impl Tile {
    /// Symbol used to pad short rows.
    pub const EMPTY_SYMBOL: char = '.';

    /// Look up a grid character. Unknown characters return `None`.
    pub fn from_char(c: char) -> Option<Tile> {
        match c {
            '.' => Some(Tile::Empty),
            '#' => Some(Tile::Platform),
            'S' => Some(Tile::Stone),
            '_' => Some(Tile::Pit),
            'C' => Some(Tile::Coin),
            'E' => Some(Tile::Enemy),
            'P' => Some(Tile::Spawn),
            'G' => Some(Tile::Goal),
            _ => None,
        }
    }
}

// =============================================================================
// TILE GRID
// =============================================================================

/// Rows of tile characters, right-padded to a common width.
///
/// Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    rows: Vec<Vec<char>>,
    tile_size: u32,
    width: usize,
}

impl TileGrid {
    /// Build a grid, padding every row with `.` to the widest row.
    pub fn new<S: AsRef<str>>(tile_size: i64, rows: &[S]) -> Result<Self, ParseError> {
        if tile_size <= 0 {
            return Err(ParseError::InvalidTileSize(tile_size));
        }

        let mut cells: Vec<Vec<char>> = rows
            .iter()
            .map(|row| row.as_ref().chars().collect())
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        let height = cells.len();

        let limit = MAX_PIXEL - LEVEL_HEADROOM;
        let too_large = (width as i64).saturating_mul(tile_size) > limit
            || (height as i64).saturating_mul(tile_size) > limit;
        if too_large {
            return Err(ParseError::LevelTooLarge { width, height });
        }

        for row in &mut cells {
            row.resize(width, Tile::EMPTY_SYMBOL);
        }

        Ok(Self {
            rows: cells,
            tile_size: tile_size as u32,
            width,
        })
    }

    /// Pixels per tile.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Columns (longest row).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row count.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Padded rows as strings.
    pub fn rows(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.iter().collect()).collect()
    }
}

// =============================================================================
// PARSED LEVEL
// =============================================================================

/// Presentation hint for platform tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundKind {
    /// Nothing solid directly above: grass/edge art
    Top,
    /// Another platform directly above: fill art
    Center,
}

/// A platform tile with its presentation hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroundTile {
    pub rect: Rect,
    pub kind: GroundKind,
}

/// Typed geometry produced by [`parse`].
///
/// `solids` is the row-major union of platforms and stones and is the
/// only list the collision resolver sees. Pits and the goal are triggers.
#[derive(Clone, Debug)]
pub struct ParsedLevel {
    platforms: Vec<Rect>,
    stones: Vec<Rect>,
    solids: Vec<Rect>,
    pits: Vec<Rect>,
    coins: Vec<Point>,
    enemy_spawns: Vec<Point>,
    spawn_point: Point,
    goal: Rect,
    tile_size: u32,
    width: usize,
    height: usize,
    digest: StateHash,
}

impl ParsedLevel {
    pub fn platforms(&self) -> &[Rect] {
        &self.platforms
    }

    pub fn stones(&self) -> &[Rect] {
        &self.stones
    }

    /// Platforms and stones in row-major order.
    pub fn solids(&self) -> &[Rect] {
        &self.solids
    }

    pub fn pits(&self) -> &[Rect] {
        &self.pits
    }

    /// Coin centre points.
    pub fn coins(&self) -> &[Point] {
        &self.coins
    }

    /// Enemy top-left anchors.
    pub fn enemy_spawns(&self) -> &[Point] {
        &self.enemy_spawns
    }

    /// Player top-left anchor.
    pub fn spawn_point(&self) -> Point {
        self.spawn_point
    }

    pub fn goal(&self) -> Rect {
        self.goal
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width in pixels.
    pub fn pixel_width(&self) -> Fixed {
        from_int(self.width as i32 * self.tile_size as i32)
    }

    /// Height in pixels.
    pub fn pixel_height(&self) -> Fixed {
        from_int(self.height as i32 * self.tile_size as i32)
    }

    /// Digest of the padded grid this level was parsed from.
    pub fn digest(&self) -> StateHash {
        self.digest
    }

    /// Classify every platform as `Top` or `Center`.
    ///
    /// Derived from the current platform set on every call.
    pub fn ground_tiles(&self) -> Vec<GroundTile> {
        classify_ground(&self.platforms, from_int(self.tile_size as i32))
    }
}

/// A platform with another platform directly above it is `Center`.
pub fn classify_ground(platforms: &[Rect], tile_size: Fixed) -> Vec<GroundTile> {
    let occupied: BTreeSet<Point> = platforms.iter().map(Rect::origin).collect();

    platforms
        .iter()
        .map(|rect| {
            let above = Point::new(rect.x, rect.y - tile_size);
            let kind = if occupied.contains(&above) {
                GroundKind::Center
            } else {
                GroundKind::Top
            };
            GroundTile { rect: *rect, kind }
        })
        .collect()
}

/// Parse a tile grid into level geometry.
///
/// Multiple `P` or `G` tiles are allowed; the last one in row-major order
/// wins.
pub fn parse(grid: &TileGrid) -> Result<ParsedLevel, ParseError> {
    let ts = grid.tile_size() as i32;
    let tile = from_int(ts);

    let mut platforms = Vec::new();
    let mut stones = Vec::new();
    let mut solids = Vec::new();
    let mut pits = Vec::new();
    let mut coins = Vec::new();
    let mut enemy_spawns = Vec::new();
    let mut spawn_point = None;
    let mut goal = None;
    let mut unknown_cells = 0usize;

    for (row_idx, row) in grid.rows.iter().enumerate() {
        for (col_idx, &ch) in row.iter().enumerate() {
            let px = col_idx as i32 * ts;
            let py = row_idx as i32 * ts;
            let origin = Point::from_ints(px, py);
            let cell = Rect::at(origin, tile, tile);

            match Tile::from_char(ch) {
                Some(Tile::Platform) => {
                    platforms.push(cell);
                    solids.push(cell);
                }
                Some(Tile::Stone) => {
                    stones.push(cell);
                    solids.push(cell);
                }
                Some(Tile::Pit) => pits.push(cell),
                Some(Tile::Coin) => coins.push(Point::from_ints(px + ts / 2, py + ts / 2)),
                Some(Tile::Enemy) => enemy_spawns.push(origin),
                Some(Tile::Spawn) => spawn_point = Some(origin),
                Some(Tile::Goal) => goal = Some(cell),
                Some(Tile::Empty) => {}
                None => unknown_cells += 1,
            }
        }
    }

    let spawn_point = spawn_point.ok_or(ParseError::MissingSpawn)?;
    let goal = goal.ok_or(ParseError::MissingGoal)?;

    let level = ParsedLevel {
        platforms,
        stones,
        solids,
        pits,
        coins,
        enemy_spawns,
        spawn_point,
        goal,
        tile_size: grid.tile_size(),
        width: grid.width(),
        height: grid.height(),
        digest: hash_grid(grid.tile_size(), &grid.rows()),
    };

    debug!(
        tile_size = level.tile_size,
        width = level.width,
        height = level.height,
        platforms = level.platforms.len(),
        stones = level.stones.len(),
        pits = level.pits.len(),
        coins = level.coins.len(),
        enemies = level.enemy_spawns.len(),
        unknown_cells,
        "level parsed: spawn {:?}, goal {:?}",
        level.spawn_point,
        level.goal.origin(),
    );

    Ok(level)
}
