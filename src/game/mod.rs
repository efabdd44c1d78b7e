//! Game Logic Module
//!
//! Level simulation. Deterministic: fixed-point only, no clocks, no
//! randomness.
//!
//! ## Module Structure
//!
//! - `input`: Per-tick input frames and delta-compressed input logs
//! - `collision`: Axis-separated box resolution
//! - `player`: Player physics and damage lifecycle
//! - `enemy`: Patrol/idle/dying enemies
//! - `animation`: State-to-frame tables and playback
//! - `events`: Game events for progression, audio and replay
//! - `runtime`: Per-level tick pipeline and camera
//! - `snapshot`: Render views
//! - `replay`: Run recording and verification

pub mod input;
pub mod collision;
pub mod player;
pub mod enemy;
pub mod animation;
pub mod events;
pub mod runtime;
pub mod snapshot;
pub mod replay;

// Re-export key types
pub use input::{InputFrame, InputLog};
pub use player::{Facing, PhysicsConfig, Player, PlayerState};
pub use enemy::{Enemy, EnemyConfig, EnemyKind};
pub use animation::{AnimState, AnimationTable, FrameRef, SpriteCatalog, StandardSheets};
pub use events::{GameEvent, GameEventData};
pub use runtime::{LevelOutcome, LevelRuntime, LiveLevelState, RuntimeConfig, TickResult};
pub use snapshot::LevelSnapshot;
pub use replay::{replay_run, RunRecorder, RunRecording};
