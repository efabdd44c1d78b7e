//! Audio Collaborator
//!
//! The core never plays sound itself. It names cues and music tracks and
//! hands them to an `AudioSink` supplied by the host.

use crate::game::events::{GameEvent, GameEventData};

/// One-shot sound effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Jump,
    Coin,
    Hit,
    GameOver,
}

impl SoundCue {
    /// Asset base name.
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Jump => "jump",
            SoundCue::Coin => "coin",
            SoundCue::Hit => "hit",
            SoundCue::GameOver => "gameover",
        }
    }

    /// Cue for a game event, if any. A stomp reuses the jump sound.
    pub fn for_event(event: &GameEvent) -> Option<SoundCue> {
        match event.data {
            GameEventData::Jumped | GameEventData::EnemyStomped { .. } => Some(SoundCue::Jump),
            GameEventData::CoinCollected { .. } => Some(SoundCue::Coin),
            GameEventData::PitFall { .. }
            | GameEventData::FellOut { .. }
            | GameEventData::PlayerHit { .. } => Some(SoundCue::Hit),
            GameEventData::PlayerDied => Some(SoundCue::GameOver),
            GameEventData::GoalReached { .. } => None,
        }
    }
}

/// Background music.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    Menu,
    Level(u32),
}

impl MusicTrack {
    /// Asset base name (`menu`, `level3`, ...).
    pub fn name(self) -> String {
        match self {
            MusicTrack::Menu => "menu".to_string(),
            MusicTrack::Level(n) => format!("level{}", n),
        }
    }
}

/// Audio playback collaborator. Missing assets are the sink's problem and
/// must degrade to silence.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    fn play_music(&mut self, track: MusicTrack);
    fn stop_music(&mut self);
}

/// Silent sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
    fn play_music(&mut self, _track: MusicTrack) {}
    fn stop_music(&mut self) {}
}

/// Play the cue for every event that has one.
pub fn play_event_cues(sink: &mut dyn AudioSink, events: &[GameEvent]) {
    for cue in events.iter().filter_map(SoundCue::for_event) {
        sink.play(cue);
    }
}
