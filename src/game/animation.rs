//! Player Animation
//!
//! A fixed state-to-frames table built once per level from whatever frame
//! sets a skin provides. `Idle` always has at least one frame, and any
//! state with no frames plays the idle frames, so lookups are total.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, to_fixed, to_int, from_int};
use crate::game::player::PlayerState;

/// Frame cursor advance per tick.
pub const ANIMATION_STEP: Fixed = to_fixed(0.15);

/// Animated player states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Hit,
}

impl AnimState {
    pub const ALL: [AnimState; 5] = [
        AnimState::Idle,
        AnimState::Run,
        AnimState::Jump,
        AnimState::Fall,
        AnimState::Hit,
    ];

    /// Animation shown for a player state.
    pub fn for_player(state: PlayerState) -> Self {
        match state {
            PlayerState::Idle | PlayerState::Win => AnimState::Idle,
            PlayerState::Run => AnimState::Run,
            PlayerState::Jump => AnimState::Jump,
            PlayerState::Fall => AnimState::Fall,
            PlayerState::Hit | PlayerState::Dead => AnimState::Hit,
        }
    }

    /// Sheet name used by sprite catalogs.
    pub fn sheet_name(self) -> &'static str {
        match self {
            AnimState::Idle => "Idle",
            AnimState::Run => "Run",
            AnimState::Jump => "Jump",
            AnimState::Fall => "Fall",
            AnimState::Hit => "Hit",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// Total mapping from `AnimState` to a non-empty frame list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationTable<F> {
    frames: [Vec<F>; 5],
}

impl<F: Clone> AnimationTable<F> {
    /// Build from a per-state lookup. An empty idle list becomes
    /// `[idle_fallback]`; other empty lists borrow the idle frames.
    pub fn build(idle_fallback: F, mut lookup: impl FnMut(AnimState) -> Vec<F>) -> Self {
        let mut frames: [Vec<F>; 5] = Default::default();
        for state in AnimState::ALL {
            frames[state.slot()] = lookup(state);
        }

        if frames[AnimState::Idle.slot()].is_empty() {
            frames[AnimState::Idle.slot()] = vec![idle_fallback];
        }
        let idle = frames[AnimState::Idle.slot()].clone();
        for list in frames.iter_mut() {
            if list.is_empty() {
                *list = idle.clone();
            }
        }

        Self { frames }
    }

    /// Frames for `state`; never empty.
    pub fn frames(&self, state: AnimState) -> &[F] {
        &self.frames[state.slot()]
    }

    /// Frame at a cursor position, wrapped into range.
    pub fn frame(&self, state: AnimState, index: usize) -> &F {
        let list = self.frames(state);
        &list[index % list.len()]
    }
}

// =============================================================================
// SPRITE CATALOG
// =============================================================================

/// One frame of a skin's sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRef {
    pub sheet: AnimState,
    pub index: u32,
    /// No art available; draw a plain box
    pub placeholder: bool,
}

impl FrameRef {
    pub const PLACEHOLDER: FrameRef = FrameRef {
        sheet: AnimState::Idle,
        index: 0,
        placeholder: true,
    };
}

/// Tells the core which frame sets exist for a skin.
pub trait SpriteCatalog {
    /// Number of frames in `skin`'s sheet for `state` (0 if absent).
    fn frame_count(&self, skin: &str, state: AnimState) -> u32;
}

/// The stock character sheets: 11 idle and 12 run frames, single frames
/// for the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSheets;

impl SpriteCatalog for StandardSheets {
    fn frame_count(&self, _skin: &str, state: AnimState) -> u32 {
        match state {
            AnimState::Idle => 11,
            AnimState::Run => 12,
            AnimState::Jump | AnimState::Fall | AnimState::Hit => 1,
        }
    }
}

/// Catalog with no art at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSprites;

impl SpriteCatalog for NoSprites {
    fn frame_count(&self, _skin: &str, _state: AnimState) -> u32 {
        0
    }
}

/// Build the frame table for `skin`.
pub fn frame_table(catalog: &dyn SpriteCatalog, skin: &str) -> AnimationTable<FrameRef> {
    AnimationTable::build(FrameRef::PLACEHOLDER, |state| {
        (0..catalog.frame_count(skin, state))
            .map(|index| FrameRef { sheet: state, index, placeholder: false })
            .collect()
    })
}

// =============================================================================
// ANIMATOR
// =============================================================================

/// Playback cursor for one actor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Animator {
    state: AnimState,
    cursor: Fixed,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnimState {
        self.state
    }

    /// Advance one tick. A state change restarts at frame 0.
    pub fn advance(&mut self, state: AnimState, frame_count: usize) {
        if state != self.state {
            self.state = state;
            self.cursor = 0;
            return;
        }

        let len = from_int(frame_count.max(1) as i32);
        self.cursor = (self.cursor + ANIMATION_STEP) % len;
    }

    /// Current whole-frame index.
    pub fn frame_index(&self) -> usize {
        to_int(self.cursor) as usize
    }

    /// Current frame from a table.
    pub fn current<'a, F: Clone>(&self, table: &'a AnimationTable<F>) -> &'a F {
        table.frame(self.state, self.frame_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdleOnly;

    impl SpriteCatalog for IdleOnly {
        fn frame_count(&self, _skin: &str, state: AnimState) -> u32 {
            if state == AnimState::Idle { 4 } else { 0 }
        }
    }

    #[test]
    fn test_standard_table() {
        let table = frame_table(&StandardSheets, "nhanvat1");
        assert_eq!(table.frames(AnimState::Idle).len(), 11);
        assert_eq!(table.frames(AnimState::Run).len(), 12);
        assert_eq!(table.frames(AnimState::Jump).len(), 1);
        assert_eq!(table.frames(AnimState::Run)[3], FrameRef {
            sheet: AnimState::Run,
            index: 3,
            placeholder: false,
        });
    }

    #[test]
    fn test_missing_art_falls_back_to_placeholder() {
        let table = frame_table(&NoSprites, "nhanvat9");
        for state in AnimState::ALL {
            assert_eq!(table.frames(state), &[FrameRef::PLACEHOLDER]);
        }
    }

    #[test]
    fn test_missing_states_borrow_idle() {
        let table = frame_table(&IdleOnly, "x");
        assert_eq!(table.frames(AnimState::Hit), table.frames(AnimState::Idle));
        assert_eq!(table.frames(AnimState::Run).len(), 4);
    }

    #[test]
    fn test_animator_wraps() {
        let mut anim = Animator::new();
        // 3 frames at 0.15/tick: wraps after 20 ticks
        for _ in 0..7 {
            anim.advance(AnimState::Idle, 3);
        }
        assert_eq!(anim.frame_index(), 1);
        for _ in 0..13 {
            anim.advance(AnimState::Idle, 3);
        }
        assert!(anim.frame_index() < 3);
    }

    #[test]
    fn test_animator_restarts_on_state_change() {
        let mut anim = Animator::new();
        for _ in 0..10 {
            anim.advance(AnimState::Idle, 11);
        }
        assert_eq!(anim.frame_index(), 1);

        anim.advance(AnimState::Run, 12);
        assert_eq!(anim.state(), AnimState::Run);
        assert_eq!(anim.frame_index(), 0);

        let table = frame_table(&StandardSheets, "nhanvat2");
        assert_eq!(anim.current(&table).sheet, AnimState::Run);
    }

    #[test]
    fn test_player_state_mapping() {
        assert_eq!(AnimState::for_player(PlayerState::Win), AnimState::Idle);
        assert_eq!(AnimState::for_player(PlayerState::Dead), AnimState::Hit);
        assert_eq!(AnimState::for_player(PlayerState::Fall), AnimState::Fall);
    }
}
