//! Enemies
//!
//! One tagged `EnemyKind` with a single update dispatch. Patrol enemies
//! walk at a constant speed with no gravity and turn around at walls and
//! ledges. Stomped enemies linger as `Dying` (non-interactive) before the
//! runtime prunes them.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, from_int, PATROL_SPEED};
use crate::core::geom::{Point, Rect};
use crate::core::hash::StateHasher;
use crate::game::collision::overlaps_any;

/// Enemy tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub body_width: Fixed,
    pub body_height: Fixed,
    /// Zero spawns every enemy as `Idle`
    pub patrol_speed: Fixed,
    /// Side length of the ledge probe box
    pub probe_size: Fixed,
    /// Gap between the enemy's feet and the top of the probe
    pub probe_drop: Fixed,
    /// Total shrink applied to the body for player contact
    pub hitbox_inset: Fixed,
    /// Ticks a stomped enemy stays visible
    pub dying_ticks: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            body_width: from_int(32),
            body_height: from_int(32),
            patrol_speed: PATROL_SPEED,
            probe_size: from_int(5),
            probe_drop: from_int(5),
            hitbox_inset: from_int(6),
            dying_ticks: 10,
        }
    }
}

/// Behaviour tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Stands still
    Idle,
    /// Walks left (-1) or right (+1)
    Patrol { direction: i8 },
    /// Stomped; removed when `ticks_left` reaches zero
    Dying { ticks_left: u32 },
}

/// A single enemy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    /// Spawn order, stable for the life of the level
    pub id: u32,
    pub rect: Rect,
    pub kind: EnemyKind,
}

impl Enemy {
    /// Spawn at a top-left anchor, initially walking right.
    pub fn spawn(id: u32, anchor: Point, config: &EnemyConfig) -> Self {
        let kind = if config.patrol_speed > 0 {
            EnemyKind::Patrol { direction: 1 }
        } else {
            EnemyKind::Idle
        };
        Self {
            id,
            rect: Rect::at(anchor, config.body_width, config.body_height),
            kind,
        }
    }

    /// Whether the player can interact with this enemy.
    #[inline]
    pub fn is_alive(&self) -> bool {
        !matches!(self.kind, EnemyKind::Dying { .. })
    }

    /// Whether the runtime should drop this enemy.
    #[inline]
    pub fn is_removed(&self) -> bool {
        matches!(self.kind, EnemyKind::Dying { ticks_left: 0 })
    }

    /// Patrol direction, 0 when not patrolling.
    pub fn direction(&self) -> i8 {
        match self.kind {
            EnemyKind::Patrol { direction } => direction,
            _ => 0,
        }
    }

    /// Box used for player contact.
    pub fn hitbox(&self, config: &EnemyConfig) -> Rect {
        self.rect.inflated(-config.hitbox_inset, -config.hitbox_inset)
    }

    /// Advance one tick.
    pub fn update(&mut self, solids: &[Rect], config: &EnemyConfig) {
        match self.kind {
            EnemyKind::Idle => {}
            EnemyKind::Patrol { direction } => {
                if let Some(turned) = self.patrol_step(direction, solids, config) {
                    self.kind = EnemyKind::Patrol { direction: turned };
                }
            }
            EnemyKind::Dying { ticks_left } => {
                self.kind = EnemyKind::Dying { ticks_left: ticks_left.saturating_sub(1) };
            }
        }
    }

    /// Step once; on a wall or a missing floor ahead, undo the step and
    /// return the reversed direction.
    fn patrol_step(&mut self, direction: i8, solids: &[Rect], config: &EnemyConfig) -> Option<i8> {
        let dx = config.patrol_speed * direction as Fixed;
        self.rect.x += dx;

        let blocked = overlaps_any(&self.rect, solids);

        let probe_x = if direction > 0 {
            self.rect.right()
        } else {
            self.rect.left() - config.probe_size
        };
        let probe = Rect::new(
            probe_x,
            self.rect.bottom() + config.probe_drop,
            config.probe_size,
            config.probe_size,
        );
        let floor_ahead = overlaps_any(&probe, solids);

        if blocked || !floor_ahead {
            self.rect.x -= dx;
            Some(-direction)
        } else {
            None
        }
    }

    /// Switch to `Dying`.
    pub fn stomp(&mut self, config: &EnemyConfig) {
        if self.is_alive() {
            self.kind = EnemyKind::Dying { ticks_left: config.dying_ticks };
        }
    }

    /// Hash the enemy state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_rect(&self.rect);
        match self.kind {
            EnemyKind::Idle => hasher.update_u8(0),
            EnemyKind::Patrol { direction } => {
                hasher.update_u8(1);
                hasher.update_u8(direction as u8);
            }
            EnemyKind::Dying { ticks_left } => {
                hasher.update_u8(2);
                hasher.update_u32(ticks_left);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ledge of four tiles at row 3, columns 2..=5.
    fn ledge() -> Vec<Rect> {
        (2..6).map(|c| Rect::from_ints(c * 32, 96, 32, 32)).collect()
    }

    #[test]
    fn test_patrol_turns_at_ledge_end() {
        let cfg = EnemyConfig::default();
        let solids = ledge();
        let left_edge = from_int(64);
        let right_edge = from_int(192);

        let mut enemy = Enemy::spawn(0, Point::from_ints(96, 64), &cfg);
        let mut turns = 0;
        let mut last_dir = enemy.direction();

        for _ in 0..1000 {
            enemy.update(&solids, &cfg);
            assert!(enemy.rect.left() >= left_edge);
            assert!(enemy.rect.right() <= right_edge);
            assert_eq!(enemy.rect.bottom(), from_int(96));
            if enemy.direction() != last_dir {
                turns += 1;
                last_dir = enemy.direction();
            }
        }
        assert!(turns >= 4);
    }

    #[test]
    fn test_turn_undoes_step() {
        let cfg = EnemyConfig::default();
        let solids = ledge();
        // Leading edge one pixel short of the end of the ledge
        let mut enemy = Enemy::spawn(0, Point::from_ints(159, 64), &cfg);

        enemy.update(&solids, &cfg);
        assert_eq!(enemy.rect.x, from_int(159));
        assert_eq!(enemy.direction(), -1);

        enemy.update(&solids, &cfg);
        assert_eq!(enemy.rect.x, from_int(158));
    }

    #[test]
    fn test_patrol_turns_at_wall() {
        let cfg = EnemyConfig::default();
        let mut solids = ledge();
        solids.push(Rect::from_ints(160, 64, 32, 32));

        let mut enemy = Enemy::spawn(0, Point::from_ints(128, 64), &cfg);
        enemy.update(&solids, &cfg);
        assert_eq!(enemy.rect.x, from_int(128));
        assert_eq!(enemy.direction(), -1);
    }

    #[test]
    fn test_idle_never_moves() {
        let cfg = EnemyConfig { patrol_speed: 0, ..EnemyConfig::default() };
        let mut enemy = Enemy::spawn(0, Point::from_ints(96, 64), &cfg);
        assert_eq!(enemy.kind, EnemyKind::Idle);

        let start = enemy.rect;
        for _ in 0..50 {
            enemy.update(&ledge(), &cfg);
        }
        assert_eq!(enemy.rect, start);
    }

    #[test]
    fn test_stomp_lingers_then_removed() {
        let cfg = EnemyConfig::default();
        let mut enemy = Enemy::spawn(3, Point::from_ints(96, 64), &cfg);
        enemy.stomp(&cfg);
        assert!(!enemy.is_alive());
        assert!(!enemy.is_removed());

        let rect = enemy.rect;
        for _ in 0..cfg.dying_ticks {
            enemy.update(&ledge(), &cfg);
            assert_eq!(enemy.rect, rect);
        }
        assert!(enemy.is_removed());
    }

    #[test]
    fn test_hitbox_inset() {
        let cfg = EnemyConfig::default();
        let enemy = Enemy::spawn(0, Point::from_ints(96, 64), &cfg);
        assert_eq!(enemy.hitbox(&cfg), Rect::from_ints(99, 67, 26, 26));
    }
}
