//! Input Frames
//!
//! One `InputFrame` per tick carries everything the player controls.
//! Recorded runs store only the ticks where the frame changed.

use serde::{Serialize, Deserialize};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Buttons held during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed button bits:
    /// - Bit 0: left held
    /// - Bit 1: right held
    /// - Bit 2: jump held
    /// - Bits 3-7: reserved
    pub flags: u8,
}

impl InputFrame {
    /// Left flag bit
    pub const FLAG_LEFT: u8 = 0x01;

    /// Right flag bit
    pub const FLAG_RIGHT: u8 = 0x02;

    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x04;

    /// No buttons held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame with the given raw bits (reserved bits are dropped).
    pub const fn from_bits(flags: u8) -> Self {
        Self {
            flags: flags & (Self::FLAG_LEFT | Self::FLAG_RIGHT | Self::FLAG_JUMP),
        }
    }

    pub const fn left() -> Self {
        Self { flags: Self::FLAG_LEFT }
    }

    pub const fn right() -> Self {
        Self { flags: Self::FLAG_RIGHT }
    }

    pub const fn jump() -> Self {
        Self { flags: Self::FLAG_JUMP }
    }

    /// Copy with jump also held.
    pub const fn with_jump(self) -> Self {
        Self { flags: self.flags | Self::FLAG_JUMP }
    }

    #[inline]
    pub fn left_held(&self) -> bool {
        self.flags & Self::FLAG_LEFT != 0
    }

    #[inline]
    pub fn right_held(&self) -> bool {
        self.flags & Self::FLAG_RIGHT != 0
    }

    #[inline]
    pub fn jump_held(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Horizontal intent: -1, 0 or +1. Right wins when both are held.
    #[inline]
    pub fn horizontal(&self) -> i8 {
        if self.right_held() {
            1
        } else if self.left_held() {
            -1
        } else {
            0
        }
    }

    /// Check if this is an idle frame (no buttons).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }

    #[inline]
    pub fn set_left(&mut self, held: bool) {
        self.set_flag(Self::FLAG_LEFT, held);
    }

    #[inline]
    pub fn set_right(&mut self, held: bool) {
        self.set_flag(Self::FLAG_RIGHT, held);
    }

    #[inline]
    pub fn set_jump(&mut self, held: bool) {
        self.set_flag(Self::FLAG_JUMP, held);
    }

    fn set_flag(&mut self, bit: u8, held: bool) {
        if held {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }
}

/// Input state that began at `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    pub tick: u32,
    pub frame: InputFrame,
}

// =============================================================================
// INPUT LOG
// =============================================================================

/// Delta-compressed per-tick input for one run.
///
/// Only ticks where the frame changed are stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLog {
    deltas: Vec<InputDelta>,
    /// Number of ticks recorded
    len: u32,
}

impl InputLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the frame for the next tick.
    pub fn push(&mut self, frame: InputFrame) {
        let tick = self.len;
        if self.deltas.last().map(|d| d.frame) != Some(frame) {
            self.deltas.push(InputDelta { tick, frame });
        }
        self.len += 1;
    }

    /// Frame held at `tick` (idle outside the recorded range).
    pub fn frame_at(&self, tick: u32) -> InputFrame {
        if tick >= self.len {
            return InputFrame::new();
        }
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Every recorded frame in tick order.
    pub fn frames(&self) -> impl Iterator<Item = InputFrame> + '_ {
        (0..self.len).map(move |tick| self.frame_at(tick))
    }
}

impl FromIterator<InputFrame> for InputLog {
    fn from_iter<I: IntoIterator<Item = InputFrame>>(iter: I) -> Self {
        let mut log = InputLog::new();
        for frame in iter {
            log.push(frame);
        }
        log
    }
}
