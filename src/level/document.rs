//! Level Documents
//!
//! The on-disk JSON shape of a level:
//!
//! ```json
//! { "tile_size": 32, "tiles": ["....", ".P.G", "####"] }
//! ```
//!
//! Extra fields are ignored. A leading UTF-8 byte-order mark is tolerated.

use serde::{Serialize, Deserialize};

use super::parser::{ParseError, TileGrid};

const BOM: char = '\u{feff}';

/// Wire form with every field optional so absence maps to `MissingField`.
#[derive(Debug, Deserialize)]
struct RawLevelDocument {
    tile_size: Option<i64>,
    tiles: Option<Vec<String>>,
}

/// A decoded level document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDocument {
    /// Pixels per tile
    pub tile_size: i64,
    /// Grid rows, top to bottom
    pub tiles: Vec<String>,
}

impl LevelDocument {
    /// Decode from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let raw: RawLevelDocument = serde_json::from_str(text)?;

        Ok(Self {
            tile_size: raw.tile_size.ok_or(ParseError::MissingField("tile_size"))?,
            tiles: raw.tiles.ok_or(ParseError::MissingField("tiles"))?,
        })
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the tile size and pad rows into a grid.
    pub fn to_grid(&self) -> Result<TileGrid, ParseError> {
        TileGrid::new(self.tile_size, &self.tiles)
    }
}
