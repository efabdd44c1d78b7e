//! Render Snapshots
//!
//! Read-only, serialisable view of a running level. Everything is
//! converted to floats here; nothing flows back into the simulation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::to_float;
use crate::core::geom::Rect;
use crate::game::animation::{AnimState, FrameRef};
use crate::game::player::{Facing, PlayerState};
use crate::game::runtime::LevelRuntime;
use crate::level::parser::GroundKind;

/// `[x, y, w, h]` in pixels.
pub type RectView = [f32; 4];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub rect: RectView,
    pub facing: Facing,
    pub state: PlayerState,
    pub anim: AnimState,
    pub frame: FrameRef,
    /// False on hidden flicker phases
    pub visible: bool,
    pub lives: u32,
    pub coins: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: u32,
    pub rect: RectView,
    pub alive: bool,
    /// -1, 0 or +1
    pub direction: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundView {
    pub rect: RectView,
    pub kind: GroundKind,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub tick: u32,
    pub level_index: u32,
    pub camera_x: f32,
    pub player: PlayerView,
    /// Coin centres
    pub coins: Vec<[f32; 2]>,
    pub enemies: Vec<EnemyView>,
    pub ground: Vec<GroundView>,
    pub stones: Vec<RectView>,
    pub pits: Vec<RectView>,
    pub goal: RectView,
}

impl LevelSnapshot {
    pub fn capture(rt: &LevelRuntime) -> Self {
        let player = rt.player();
        let level = rt.level();
        let animator = rt.animator();

        Self {
            tick: rt.tick_count(),
            level_index: rt.level_index(),
            camera_x: to_float(rt.camera_x()),
            player: PlayerView {
                rect: player.rect.to_floats(),
                facing: player.facing,
                state: player.state,
                anim: animator.state(),
                frame: *animator.current(rt.frames()),
                visible: rt.player_visible(),
                lives: player.lives,
                coins: player.coins,
            },
            coins: rt
                .live()
                .remaining_coins
                .iter()
                .map(|c| {
                    let (x, y) = c.to_floats();
                    [x, y]
                })
                .collect(),
            enemies: rt
                .live()
                .enemies
                .iter()
                .map(|e| EnemyView {
                    id: e.id,
                    rect: e.rect.to_floats(),
                    alive: e.is_alive(),
                    direction: e.direction(),
                })
                .collect(),
            ground: level
                .ground_tiles()
                .into_iter()
                .map(|g| GroundView { rect: g.rect.to_floats(), kind: g.kind })
                .collect(),
            stones: level.stones().iter().map(Rect::to_floats).collect(),
            pits: level.pits().iter().map(Rect::to_floats).collect(),
            goal: level.goal().to_floats(),
        }
    }

    /// Encode as JSON for external renderers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
