//! State Digests
//!
//! SHA-256 fingerprints used to check that two runs (or two parses) agree:
//! - live level state, checkpointed during recording and compared on replay
//! - the padded tile grid, so a recording refuses to replay on another level
//!
//! Every value is written little-endian in a fixed order; callers own
//! that order.

use sha2::{Digest, Sha256};

use super::fixed::Fixed;
use super::geom::{Point, Rect};

/// 32-byte SHA-256 digest.
pub type StateHash = [u8; 32];

const LEVEL_STATE_DOMAIN: &[u8] = b"TILESTEP_STATE_V1";
const LEVEL_GRID_DOMAIN: &[u8] = b"TILESTEP_GRID_V1";

/// Incremental digest over simulation values.
///
/// The domain tag keeps a state digest from ever matching a grid digest.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Start a digest tagged with `domain`.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    pub fn for_level_state() -> Self {
        Self::new(LEVEL_STATE_DOMAIN)
    }

    pub fn for_level_grid() -> Self {
        Self::new(LEVEL_GRID_DOMAIN)
    }

    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.update_bytes(&[value]);
    }

    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.update_bytes(&value.to_le_bytes());
    }

    /// Raw Q16.16 bits, so equal positions always digest equally.
    #[inline]
    pub fn update_fixed(&mut self, value: Fixed) {
        self.update_bytes(&value.to_le_bytes());
    }

    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(u8::from(value));
    }

    /// `x` then `y`.
    #[inline]
    pub fn update_point(&mut self, value: Point) {
        self.update_fixed(value.x);
        self.update_fixed(value.y);
    }

    /// Origin then size.
    #[inline]
    pub fn update_rect(&mut self, value: &Rect) {
        self.update_point(value.origin());
        self.update_fixed(value.w);
        self.update_fixed(value.h);
    }

    /// Byte length first, so adjacent strings cannot run together.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.update_bytes(value.as_bytes());
    }

    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Digest of a running level at `tick`.
///
/// Tick and level index go in first; `write_state` appends the rest.
pub fn compute_state_hash<F>(tick: u32, level_index: u32, write_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut state = StateHasher::for_level_state();
    state.update_u32(tick);
    state.update_u32(level_index);
    write_state(&mut state);
    state.finalize()
}

/// Digest of a padded tile grid and its tile size.
pub fn hash_grid(tile_size: u32, rows: &[String]) -> StateHash {
    let mut grid = StateHasher::for_level_grid();
    grid.update_u32(tile_size);
    grid.update_u32(rows.len() as u32);
    for row in rows {
        grid.update_str(row);
    }
    grid.finalize()
}
