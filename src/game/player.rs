//! Player Simulation
//!
//! Input, gravity, axis-separated movement and the damage/respawn
//! lifecycle of the single player actor. Time is the runtime's tick
//! counter; every window is an absolute expiry tick compared with
//! `now < expiry`.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{
    Fixed, from_int, fixed_add, fixed_clamp,
    RUN_SPEED, JUMP_IMPULSE, GRAVITY, TERMINAL_FALL_SPEED, KNOCKBACK_IMPULSE, STOMP_BOUNCE,
};
use crate::core::geom::{Point, Rect};
use crate::core::hash::StateHasher;
use crate::game::collision::{push_out, resolve_axis, Axis};
use crate::game::input::InputFrame;

// =============================================================================
// CONFIG
// =============================================================================

/// Player tuning. Velocities are per tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub body_width: Fixed,
    pub body_height: Fixed,
    pub run_speed: Fixed,
    /// Negative is up
    pub jump_impulse: Fixed,
    pub gravity: Fixed,
    pub terminal_fall_speed: Fixed,
    pub knockback_impulse: Fixed,
    pub stomp_bounce: Fixed,
    pub starting_lives: u32,
    pub invincibility_ticks: u32,
    /// Ticks after a knockback hit during which input is ignored
    pub hit_lock_ticks: u32,
    /// Half-period of the invincibility flicker
    pub flicker_ticks: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            body_width: from_int(20),
            body_height: from_int(30),
            run_speed: RUN_SPEED,
            jump_impulse: JUMP_IMPULSE,
            gravity: GRAVITY,
            terminal_fall_speed: TERMINAL_FALL_SPEED,
            knockback_impulse: KNOCKBACK_IMPULSE,
            stomp_bounce: STOMP_BOUNCE,
            starting_lives: 6,
            invincibility_ticks: 120,
            hit_lock_ticks: 12,
            flicker_ticks: 6,
        }
    }
}

// =============================================================================
// PLAYER TYPES
// =============================================================================

/// Horizontal facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Player state label.
///
/// `Dead` and `Win` are absorbing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerState {
    #[default]
    Idle = 0,
    Run = 1,
    Jump = 2,
    Fall = 3,
    /// Knockback reaction, input suppressed
    Hit = 4,
    Dead = 5,
    Win = 6,
}

impl PlayerState {
    /// Whether no further simulation happens.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, PlayerState::Dead | PlayerState::Win)
    }
}

/// Result of a `take_damage` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invincible (and not forced), or already terminal
    Ignored,
    /// Life lost, teleported to spawn
    Respawned,
    /// Life lost, knocked upward and made invincible
    Knocked,
    /// Last life lost
    Died,
}

impl DamageOutcome {
    /// Whether a life was taken.
    pub fn applied(self) -> bool {
        !matches!(self, DamageOutcome::Ignored)
    }
}

/// Extent the player moves within.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayBounds {
    /// Right edge of the map; the left edge is 0
    pub width: Fixed,
    /// Falling with the top edge below this counts as a pit
    pub kill_plane_y: Fixed,
}

/// What happened inside `Player::step`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub jumped: bool,
    /// Set when the kill plane applied damage
    pub fell_out: Option<DamageOutcome>,
}

// =============================================================================
// PLAYER
// =============================================================================

/// The player actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub rect: Rect,
    pub vel_x: Fixed,
    pub vel_y: Fixed,
    pub on_ground: bool,
    pub facing: Facing,
    pub lives: u32,
    pub invincible: bool,
    /// First tick at which invincibility no longer applies
    pub invincible_until: u32,
    /// First tick at which input is read again
    pub hit_lock_until: u32,
    /// Coins picked up in this level
    pub coins: u32,
    pub state: PlayerState,
    spawn: Point,
}

impl Player {
    /// Create a player at a spawn anchor.
    pub fn new(spawn: Point, config: &PhysicsConfig) -> Self {
        Self {
            rect: Rect::at(spawn, config.body_width, config.body_height),
            vel_x: 0,
            vel_y: 0,
            on_ground: false,
            facing: Facing::Right,
            lives: config.starting_lives,
            invincible: false,
            invincible_until: 0,
            hit_lock_until: 0,
            coins: 0,
            state: PlayerState::Idle,
            spawn,
        }
    }

    /// Whether non-forced damage is ignored at `now`.
    #[inline]
    pub fn is_invincible(&self, now: u32) -> bool {
        self.invincible && now < self.invincible_until
    }

    /// Whether input is suppressed at `now`.
    #[inline]
    pub fn is_hit_locked(&self, now: u32) -> bool {
        now < self.hit_lock_until
    }

    /// Flicker visibility: hidden on alternating phases while invincible.
    pub fn is_visible(&self, now: u32, config: &PhysicsConfig) -> bool {
        if !self.is_invincible(now) {
            return true;
        }
        let period = config.flicker_ticks.max(1);
        (now / period) % 2 == 1
    }

    /// Advance one tick.
    ///
    /// Order: expire invincibility, read input (unless hit-locked), apply
    /// gravity, move and resolve X (clamped to the map), move and resolve
    /// Y, then check the kill plane. No-op once terminal.
    pub fn step(
        &mut self,
        input: InputFrame,
        solids: &[Rect],
        bounds: PlayBounds,
        now: u32,
        config: &PhysicsConfig,
    ) -> StepReport {
        let mut report = StepReport::default();
        if self.state.is_terminal() {
            return report;
        }

        if self.invincible && now >= self.invincible_until {
            self.invincible = false;
        }

        let locked = self.is_hit_locked(now);
        if !locked {
            match input.horizontal() {
                1 => {
                    self.vel_x = config.run_speed;
                    self.facing = Facing::Right;
                }
                -1 => {
                    self.vel_x = -config.run_speed;
                    self.facing = Facing::Left;
                }
                _ => self.vel_x = 0,
            }

            if input.jump_held() && self.on_ground {
                self.vel_y = config.jump_impulse;
                self.on_ground = false;
                report.jumped = true;
            }
        }

        self.vel_y = fixed_add(self.vel_y, config.gravity).min(config.terminal_fall_speed);

        // X: move, keep inside the map, then push out of solids
        let mut moved = self.rect.translated(self.vel_x, 0);
        let max_x = (bounds.width - moved.w).max(0);
        moved.x = fixed_clamp(moved.x, 0, max_x);
        self.rect = push_out(moved, self.vel_x, solids, Axis::X).rect;

        // Y
        let y = resolve_axis(self.rect, self.vel_y, solids, Axis::Y);
        self.rect = y.rect;
        self.vel_y = y.velocity;
        self.on_ground = y.grounded;

        self.state = self.motion_state(locked);

        if self.rect.top() > bounds.kill_plane_y {
            report.fell_out = Some(self.take_damage(true, now, config));
        }

        report
    }

    fn motion_state(&self, locked: bool) -> PlayerState {
        if locked {
            PlayerState::Hit
        } else if !self.on_ground {
            if self.vel_y < 0 {
                PlayerState::Jump
            } else {
                PlayerState::Fall
            }
        } else if self.vel_x != 0 {
            PlayerState::Run
        } else {
            PlayerState::Idle
        }
    }

    /// Take one life.
    ///
    /// Non-forced damage is ignored while invincible. Forced damage
    /// teleports to spawn with zero velocity; non-forced damage knocks the
    /// player upward and opens the invincibility and hit-lock windows.
    /// Reaching zero lives is terminal.
    pub fn take_damage(&mut self, force_respawn: bool, now: u32, config: &PhysicsConfig) -> DamageOutcome {
        if self.state.is_terminal() {
            return DamageOutcome::Ignored;
        }
        if !force_respawn && self.is_invincible(now) {
            return DamageOutcome::Ignored;
        }

        self.lives = self.lives.saturating_sub(1);

        if self.lives == 0 {
            self.state = PlayerState::Dead;
            self.vel_x = 0;
            self.vel_y = 0;
            debug!(tick = now, "player died");
            return DamageOutcome::Died;
        }

        if force_respawn {
            self.rect.set_origin(self.spawn);
            self.vel_x = 0;
            self.vel_y = 0;
            self.on_ground = false;
            debug!(tick = now, lives = self.lives, "player respawned");
            DamageOutcome::Respawned
        } else {
            self.vel_x = 0;
            self.vel_y = config.knockback_impulse;
            self.invincible = true;
            self.invincible_until = now.saturating_add(config.invincibility_ticks);
            self.hit_lock_until = now.saturating_add(config.hit_lock_ticks);
            self.state = PlayerState::Hit;
            debug!(tick = now, lives = self.lives, "player knocked back");
            DamageOutcome::Knocked
        }
    }

    /// Upward bounce after a stomp.
    pub fn bounce(&mut self, config: &PhysicsConfig) {
        self.vel_y = config.stomp_bounce;
        self.on_ground = false;
    }

    /// Count a coin picked up in this level.
    pub fn add_coin(&mut self) {
        self.coins = self.coins.saturating_add(1);
    }

    /// Enter the absorbing `Win` state.
    pub fn reach_goal(&mut self) {
        if !self.state.is_terminal() {
            self.state = PlayerState::Win;
            self.vel_x = 0;
            self.vel_y = 0;
        }
    }

    /// Hash the player state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_rect(&self.rect);
        hasher.update_fixed(self.vel_x);
        hasher.update_fixed(self.vel_y);
        hasher.update_bool(self.on_ground);
        hasher.update_u8(self.facing as u8);
        hasher.update_u32(self.lives);
        hasher.update_bool(self.invincible);
        hasher.update_u32(self.invincible_until);
        hasher.update_u32(self.hit_lock_until);
        hasher.update_u32(self.coins);
        hasher.update_u8(self.state as u8);
    }
}
