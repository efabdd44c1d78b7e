//! # Tilestep
//!
//! Deterministic simulation core for a 2D tile-based platformer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         TILESTEP                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── geom.rs     - Points and axis-aligned boxes             │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  level/          - Level data                                │
//! │  ├── document.rs - JSON level documents                      │
//! │  ├── parser.rs   - Tile grid → solids, hazards, triggers     │
//! │  └── library.rs  - Numbered level sources                    │
//! │                                                              │
//! │  game/           - Level simulation (deterministic)          │
//! │  ├── input.rs    - Input frames and logs                     │
//! │  ├── collision.rs- Axis-separated resolution                 │
//! │  ├── player.rs   - Player physics and damage                 │
//! │  ├── enemy.rs    - Patrolling enemies                        │
//! │  ├── animation.rs- Frame tables and playback                 │
//! │  ├── runtime.rs  - Per-level tick pipeline                   │
//! │  ├── snapshot.rs - Render views                              │
//! │  └── replay.rs   - Run recording and verification            │
//! │                                                              │
//! │  session/        - Around the level (non-deterministic)      │
//! │  ├── machine.rs  - Screens and transitions                   │
//! │  ├── shop.rs     - Coins, unlocks, skins, save file          │
//! │  └── audio.rs    - Sound cues and music                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `level/` and `game/` modules are deterministic:
//! - No floating-point arithmetic in game logic
//! - No HashMap (BTreeMap/BTreeSet for sorted iteration)
//! - No system time; the tick counter is the only clock
//!
//! Given the same level and the same input frames, a run produces the
//! same state hash on any platform.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod level;
pub mod game;
pub mod session;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::geom::{Point, Rect};
pub use level::{load_level, LevelSource, ParsedLevel, TileGrid};
pub use game::input::{InputDelta, InputFrame, InputLog};
pub use game::runtime::{LevelOutcome, LevelRuntime, RuntimeConfig, TickResult};
pub use session::{Screen, Session, SessionAction, Shop, ShopStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Viewport width in pixels; the camera centres the player in it
pub const VIEWPORT_WIDTH: u32 = 800;

/// Viewport height in pixels
pub const VIEWPORT_HEIGHT: u32 = 380;

/// Number of levels shipped with the game
pub const LEVEL_COUNT: u32 = 6;
