//! Game Events
//!
//! Events generated during a tick, consumed by the session (progression,
//! audio cues) and by run recordings.

use serde::{Serialize, Deserialize};
use crate::core::geom::Point;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Terminal outcomes first
    Outcome = 0,
    /// Then life loss
    Damage = 1,
    /// Then enemy removal
    Combat = 2,
    /// Then pickups
    Pickup = 3,
    /// Lowest priority
    Movement = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player left the ground with a jump impulse
    Jumped,

    /// Player touched a pit and was sent back to spawn
    PitFall { lives_left: u32 },

    /// Player dropped below the kill plane and was sent back to spawn
    FellOut { lives_left: u32 },

    /// Player touched an enemy from the side or below
    PlayerHit { enemy: u32, lives_left: u32 },

    /// Player ran out of lives
    PlayerDied,

    /// Coin at `at` was picked up
    CoinCollected { at: Point, remaining: u32 },

    /// Enemy was stomped from above
    EnemyStomped { enemy: u32 },

    /// Player touched the goal
    GoalReached { coins: u32 },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event with the priority implied by its data.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        let priority = match &data {
            GameEventData::PlayerDied | GameEventData::GoalReached { .. } => EventPriority::Outcome,
            GameEventData::PitFall { .. }
            | GameEventData::FellOut { .. }
            | GameEventData::PlayerHit { .. } => EventPriority::Damage,
            GameEventData::EnemyStomped { .. } => EventPriority::Combat,
            GameEventData::CoinCollected { .. } => EventPriority::Pickup,
            GameEventData::Jumped => EventPriority::Movement,
        };

        Self { tick, priority, data }
    }

    pub fn jumped(tick: u32) -> Self {
        Self::new(tick, GameEventData::Jumped)
    }

    pub fn pit_fall(tick: u32, lives_left: u32) -> Self {
        Self::new(tick, GameEventData::PitFall { lives_left })
    }

    pub fn fell_out(tick: u32, lives_left: u32) -> Self {
        Self::new(tick, GameEventData::FellOut { lives_left })
    }

    pub fn player_hit(tick: u32, enemy: u32, lives_left: u32) -> Self {
        Self::new(tick, GameEventData::PlayerHit { enemy, lives_left })
    }

    pub fn player_died(tick: u32) -> Self {
        Self::new(tick, GameEventData::PlayerDied)
    }

    pub fn coin_collected(tick: u32, at: Point, remaining: u32) -> Self {
        Self::new(tick, GameEventData::CoinCollected { at, remaining })
    }

    pub fn enemy_stomped(tick: u32, enemy: u32) -> Self {
        Self::new(tick, GameEventData::EnemyStomped { enemy })
    }

    pub fn goal_reached(tick: u32, coins: u32) -> Self {
        Self::new(tick, GameEventData::GoalReached { coins })
    }

    /// Whether this event ends the level.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::PlayerDied | GameEventData::GoalReached { .. })
    }

    /// Processing order: tick, then priority.
    #[inline]
    pub fn sort_key(&self) -> (u32, EventPriority) {
        (self.tick, self.priority)
    }
}

/// Stable sort into processing order. Events with equal keys keep the
/// order they were raised in.
pub fn sort_events(events: &mut [GameEvent]) {
    events.sort_by_key(GameEvent::sort_key);
}
