//! Level loading and tile grid parsing.

pub mod document;
pub mod library;
pub mod parser;

pub use document::LevelDocument;
pub use library::{load_level, DirLevelSource, LevelSource, LoadError, MemoryLevelSource};
pub use parser::{parse, GroundKind, GroundTile, ParseError, ParsedLevel, Tile, TileGrid};
