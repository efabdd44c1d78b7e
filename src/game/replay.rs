//! Run Recording and Replay
//!
//! A recording holds the per-tick input of one level attempt plus state
//! hash checkpoints. Replaying it against a fresh parse of the same level
//! must reproduce every checkpoint and the final hash bit for bit.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::game::animation::{frame_table, NoSprites};
use crate::game::input::{InputFrame, InputLog};
use crate::game::runtime::{LevelOutcome, LevelRuntime, RuntimeConfig, TickResult};
use crate::level::parser::ParsedLevel;
use crate::session::shop::{Shop, ShopStore};

/// Current recording format version.
pub const RECORDING_VERSION: u8 = 1;

/// Checkpoint interval in ticks (every 10 seconds at 60 Hz).
pub const CHECKPOINT_INTERVAL: u32 = 600;

/// Errors that can occur with recordings.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to encode recording: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode recording: {0}")]
    Decode(#[source] bincode::Error),

    #[error("recording version {got} is not supported (expected {expected})")]
    UnsupportedVersion { expected: u8, got: u8 },

    #[error("recording was made against a different level")]
    LevelMismatch,
}

/// State hash at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    pub tick: u32,
    pub state_hash: StateHash,
}

/// A recorded level attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecording {
    /// Version for forward compatibility
    pub version: u8,
    pub level_index: u32,
    /// Digest of the grid the run was played on
    pub level_digest: StateHash,
    pub inputs: InputLog,
    pub checkpoints: Vec<StateCheckpoint>,
    pub final_hash: StateHash,
    pub outcome: Option<LevelOutcome>,
}

impl RunRecording {
    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReplayError> {
        bincode::serialize(self).map_err(ReplayError::Encode)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ReplayError> {
        let recording: Self = bincode::deserialize(data).map_err(ReplayError::Decode)?;
        if recording.version != RECORDING_VERSION {
            return Err(ReplayError::UnsupportedVersion {
                expected: RECORDING_VERSION,
                got: recording.version,
            });
        }
        Ok(recording)
    }

    /// Recorded tick count.
    pub fn tick_count(&self) -> u32 {
        self.inputs.len()
    }
}

// =============================================================================
// RECORDER
// =============================================================================

/// Drives a runtime while recording it.
#[derive(Clone, Debug)]
pub struct RunRecorder {
    level_index: u32,
    level_digest: StateHash,
    inputs: InputLog,
    checkpoints: Vec<StateCheckpoint>,
}

impl RunRecorder {
    /// Start recording a runtime that has not ticked yet.
    pub fn new(runtime: &LevelRuntime) -> Self {
        Self {
            level_index: runtime.level_index(),
            level_digest: runtime.level().digest(),
            inputs: InputLog::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Tick `runtime` and record the input. Ticks after the level has
    /// ended are not recorded.
    pub fn step(&mut self, runtime: &mut LevelRuntime, input: InputFrame, shop: &mut dyn Shop) -> TickResult {
        if runtime.is_finished() {
            return TickResult::default();
        }

        let result = runtime.tick(input, shop);
        self.inputs.push(input);

        let tick = runtime.tick_count();
        if tick % CHECKPOINT_INTERVAL == 0 {
            self.checkpoints.push(StateCheckpoint { tick, state_hash: runtime.compute_hash() });
        }
        result
    }

    /// Close the recording.
    pub fn finish(self, runtime: &LevelRuntime) -> RunRecording {
        RunRecording {
            version: RECORDING_VERSION,
            level_index: self.level_index,
            level_digest: self.level_digest,
            inputs: self.inputs,
            checkpoints: self.checkpoints,
            final_hash: runtime.compute_hash(),
            outcome: runtime.outcome(),
        }
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Outcome of re-simulating a recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayReport {
    pub final_hash: StateHash,
    /// Final hash and every checkpoint agree
    pub matches: bool,
    /// Tick of the first checkpoint that disagreed
    pub first_divergence: Option<u32>,
    pub ticks: u32,
    pub outcome: Option<LevelOutcome>,
}

/// Re-simulate `recording` on a fresh runtime for `level`.
///
/// Coins go to a throwaway in-memory shop.
pub fn replay_run(
    level: ParsedLevel,
    recording: &RunRecording,
    config: RuntimeConfig,
) -> Result<ReplayReport, ReplayError> {
    if level.digest() != recording.level_digest {
        return Err(ReplayError::LevelMismatch);
    }

    let mut runtime = LevelRuntime::new(
        level,
        recording.level_index,
        config,
        frame_table(&NoSprites, ""),
    );
    let mut shop = ShopStore::in_memory();
    let mut checkpoints = recording.checkpoints.iter().peekable();
    let mut first_divergence = None;

    for frame in recording.inputs.frames() {
        runtime.tick(frame, &mut shop);

        let tick = runtime.tick_count();
        if let Some(cp) = checkpoints.next_if(|cp| cp.tick == tick) {
            if first_divergence.is_none() && cp.state_hash != runtime.compute_hash() {
                warn!(tick, "replay diverged from recorded checkpoint");
                first_divergence = Some(tick);
            }
        }
    }

    let final_hash = runtime.compute_hash();
    let matches = first_divergence.is_none()
        && checkpoints.next().is_none()
        && final_hash == recording.final_hash;

    debug!(
        ticks = recording.tick_count(),
        matches,
        final_hash = %hex::encode(final_hash),
        "replay complete"
    );

    Ok(ReplayReport {
        final_hash,
        matches,
        first_divergence,
        ticks: runtime.tick_count(),
        outcome: runtime.outcome(),
    })
}
