//! Session State Machine
//!
//! Menu, level select, shop, gameplay, pause and game over. Transitions
//! are driven by explicit actions; gameplay outcomes (win, death) are
//! picked up from the running level on each tick.
//!
//! ```text
//!   Menu ──► LevelSelect ──pick──► Playing ◄──resume── Pause
//!    │  ▲         ▲                 │  │ └──pause/back──► │
//!    ▼  │         └──last level won─┘  │                  ▼
//!   Shop                          died ▼                 Menu
//!                                    GameOver ──replay──► Playing
//! ```

use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::game::animation::{frame_table, SpriteCatalog, StandardSheets};
use crate::game::input::InputFrame;
use crate::game::runtime::{LevelOutcome, LevelRuntime, RuntimeConfig, TickResult};
use crate::level::library::{load_level, LevelSource, LoadError};
use crate::session::audio::{play_event_cues, AudioSink, MusicTrack, NullAudio};
use crate::session::shop::{PurchaseResult, Shop};

/// Current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Menu,
    LevelSelect,
    Shop,
    Playing,
    Pause,
    GameOver,
}

impl Screen {
    /// Screens that share the menu music.
    pub fn in_menu_group(self) -> bool {
        matches!(self, Screen::Menu | Screen::LevelSelect | Screen::Shop)
    }
}

/// User-triggered actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    OpenLevelSelect,
    OpenShop,
    /// Escape: playing → pause, shop/level select → menu
    Back,
    PickLevel(u32),
    Pause,
    Resume,
    /// Restart the current level from scratch after a game over
    Replay,
    ToMenu,
    BuySkin(String),
    EquipSkin(String),
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionAction::PickLevel(n) => write!(f, "pick level {}", n),
            SessionAction::BuySkin(s) => write!(f, "buy {}", s),
            SessionAction::EquipSkin(s) => write!(f, "equip {}", s),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Errors returned by `Session::handle`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Action not valid on this screen; nothing changed
    #[error("cannot {action} from {from:?}")]
    InvalidTransition { from: Screen, action: SessionAction },

    /// Level is not unlocked yet; nothing changed
    #[error("level {0} is locked")]
    LevelLocked(u32),

    /// Level could not be loaded; the session is back on level select
    #[error("level {index} is unavailable: {source}")]
    LevelUnavailable {
        index: u32,
        #[source]
        source: LoadError,
    },
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Levels are numbered `1..=level_count`
    pub level_count: u32,
    /// Tuning for every level started by the session
    pub runtime: RuntimeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            level_count: crate::LEVEL_COUNT,
            runtime: RuntimeConfig::default(),
        }
    }
}

/// A level-select button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEntry {
    pub index: u32,
    pub locked: bool,
}

/// Top-level game session.
pub struct Session {
    screen: Screen,
    config: SessionConfig,
    levels: Box<dyn LevelSource>,
    shop: Box<dyn Shop>,
    audio: Box<dyn AudioSink>,
    sprites: Box<dyn SpriteCatalog>,
    runtime: Option<LevelRuntime>,
    level_index: u32,
}

impl Session {
    /// Create a session on the menu screen with silent audio and the
    /// standard sprite sheets.
    pub fn new(config: SessionConfig, levels: Box<dyn LevelSource>, shop: Box<dyn Shop>) -> Self {
        let mut session = Self {
            screen: Screen::Menu,
            config,
            levels,
            shop,
            audio: Box::new(NullAudio),
            sprites: Box::new(StandardSheets),
            runtime: None,
            level_index: 1,
        };
        session.audio.play_music(MusicTrack::Menu);
        session
    }

    /// Replace the audio sink. The menu track is started on it.
    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        if self.screen.in_menu_group() {
            self.audio.play_music(MusicTrack::Menu);
        }
        self
    }

    pub fn with_sprites(mut self, sprites: Box<dyn SpriteCatalog>) -> Self {
        self.sprites = sprites;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn shop(&self) -> &dyn Shop {
        self.shop.as_ref()
    }

    /// The running (or paused, or just-lost) level.
    pub fn runtime(&self) -> Option<&LevelRuntime> {
        self.runtime.as_ref()
    }

    /// Index of the current or most recent level.
    pub fn level_index(&self) -> u32 {
        self.level_index
    }

    /// Level-select buttons, locked above the highest unlocked level.
    pub fn level_select_entries(&self) -> Vec<LevelEntry> {
        let max = self.shop.max_unlocked_level();
        (1..=self.config.level_count)
            .map(|index| LevelEntry { index, locked: index > max })
            .collect()
    }

    /// Apply a user action and return the resulting screen.
    pub fn handle(&mut self, action: SessionAction) -> Result<Screen, SessionError> {
        match (self.screen, action) {
            (Screen::Menu, SessionAction::OpenLevelSelect) => self.set_screen(Screen::LevelSelect),
            (Screen::Menu, SessionAction::OpenShop) => self.set_screen(Screen::Shop),

            (Screen::LevelSelect, SessionAction::PickLevel(index)) => {
                if index == 0 || index > self.shop.max_unlocked_level() {
                    return Err(SessionError::LevelLocked(index));
                }
                self.start_level(index)?;
            }
            (Screen::LevelSelect | Screen::Shop, SessionAction::Back) => self.set_screen(Screen::Menu),

            (Screen::Shop, SessionAction::BuySkin(skin)) => {
                let result = self.shop.buy_skin(&skin);
                match result {
                    PurchaseResult::Purchased => info!(skin = %skin, "skin purchased"),
                    other => info!(skin = %skin, result = ?other, "skin not purchased"),
                }
            }
            (Screen::Shop, SessionAction::EquipSkin(skin)) => {
                if !self.shop.equip_skin(&skin) {
                    info!(skin = %skin, "cannot equip a skin that is not owned");
                }
            }

            (Screen::Playing, SessionAction::Pause | SessionAction::Back) => self.set_screen(Screen::Pause),
            (Screen::Pause, SessionAction::Resume) => self.set_screen(Screen::Playing),
            (Screen::Pause | Screen::GameOver, SessionAction::ToMenu) => {
                self.runtime = None;
                self.set_screen(Screen::Menu);
            }
            (Screen::GameOver, SessionAction::Replay) => self.start_level(self.level_index)?,

            (from, action) => return Err(SessionError::InvalidTransition { from, action }),
        }
        Ok(self.screen)
    }

    /// Advance gameplay by one tick. A no-op outside `Playing`.
    pub fn tick(&mut self, input: InputFrame) -> TickResult {
        if self.screen != Screen::Playing {
            return TickResult::default();
        }
        let Some(runtime) = self.runtime.as_mut() else {
            return TickResult::default();
        };

        let result = runtime.tick(input, self.shop.as_mut());
        play_event_cues(self.audio.as_mut(), &result.events);

        match result.outcome {
            Some(LevelOutcome::Died) => {
                info!(level = self.level_index, "game over");
                self.set_screen(Screen::GameOver);
            }
            Some(LevelOutcome::Won) => self.advance_after_win(),
            None => {}
        }
        result
    }

    fn advance_after_win(&mut self) {
        let finished = self.level_index;
        self.shop.unlock_next_level(finished);

        let next = finished + 1;
        if next <= self.config.level_count && self.levels.contains(next) {
            if let Err(e) = self.start_level(next) {
                warn!(level = next, error = %e, "next level failed to load");
            }
        } else {
            info!(level = finished, "no further levels");
            self.runtime = None;
            self.set_screen(Screen::LevelSelect);
        }
    }

    /// Parse the level fresh and start playing it. On failure no runtime
    /// is kept and the session falls back to level select.
    fn start_level(&mut self, index: u32) -> Result<(), SessionError> {
        self.runtime = None;

        let level = match load_level(self.levels.as_ref(), index) {
            Ok(level) => level,
            Err(source) => {
                warn!(level = index, error = %source, "level failed to load");
                self.set_screen(Screen::LevelSelect);
                return Err(SessionError::LevelUnavailable { index, source });
            }
        };

        let frames = frame_table(self.sprites.as_ref(), self.shop.equipped_skin());
        self.runtime = Some(LevelRuntime::new(level, index, self.config.runtime.clone(), frames));
        self.level_index = index;

        self.set_screen(Screen::Playing);
        self.audio.play_music(MusicTrack::Level(index));
        info!(level = index, "level started");
        Ok(())
    }

    fn set_screen(&mut self, next: Screen) {
        let prev = self.screen;
        if prev.in_menu_group() && next == Screen::Playing {
            self.audio.stop_music();
        } else if !prev.in_menu_group() && next.in_menu_group() {
            self.audio.play_music(MusicTrack::Menu);
        }
        if prev != next {
            info!(from = ?prev, to = ?next, "screen changed");
        }
        self.screen = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::game::player::PhysicsConfig;
    use crate::level::library::MemoryLevelSource;
    use crate::session::audio::SoundCue;
    use crate::session::shop::{ShopState, ShopStore};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Played {
        Cue(SoundCue),
        Music(MusicTrack),
        Stop,
    }

    #[derive(Clone, Default)]
    struct SharedAudio(Rc<RefCell<Vec<Played>>>);

    impl AudioSink for SharedAudio {
        fn play(&mut self, cue: SoundCue) {
            self.0.borrow_mut().push(Played::Cue(cue));
        }
        fn play_music(&mut self, track: MusicTrack) {
            self.0.borrow_mut().push(Played::Music(track));
        }
        fn stop_music(&mut self) {
            self.0.borrow_mut().push(Played::Stop);
        }
    }

    /// Two quick levels where walking right reaches the goal, plus a
    /// bottomless third.
    fn levels() -> MemoryLevelSource {
        MemoryLevelSource::new()
            .with_rows(1, 32, &["PG", "##"])
            .with_rows(2, 32, &["P.G", "###"])
            .with_rows(3, 32, &["P.G", "..."])
    }

    fn session_with(shop: ShopStore, levels: MemoryLevelSource, config: SessionConfig) -> Session {
        Session::new(config, Box::new(levels), Box::new(shop))
    }

    fn session() -> Session {
        session_with(ShopStore::in_memory(), levels(), SessionConfig::default())
    }

    fn tick_until_screen_changes(session: &mut Session, input: InputFrame, max: u32) -> Screen {
        let start = session.screen();
        for _ in 0..max {
            session.tick(input);
            if session.screen() != start || session.runtime().map_or(false, |rt| rt.tick_count() == 0) {
                return session.screen();
            }
        }
        session.screen()
    }

    #[test]
    fn test_menu_navigation() {
        let mut s = session();
        assert_eq!(s.screen(), Screen::Menu);
        assert_eq!(s.handle(SessionAction::OpenShop).unwrap(), Screen::Shop);
        assert_eq!(s.handle(SessionAction::Back).unwrap(), Screen::Menu);
        assert_eq!(s.handle(SessionAction::OpenLevelSelect).unwrap(), Screen::LevelSelect);
        assert_eq!(s.handle(SessionAction::Back).unwrap(), Screen::Menu);
    }

    #[test]
    fn test_invalid_transition_leaves_state() {
        let mut s = session();
        let err = s.handle(SessionAction::Resume).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition { from: Screen::Menu, action: SessionAction::Resume }
        ));
        assert_eq!(s.screen(), Screen::Menu);

        assert!(s.handle(SessionAction::PickLevel(1)).is_err());
        assert!(s.runtime().is_none());
    }

    #[test]
    fn test_locked_level_refused() {
        let mut s = session();
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        assert!(matches!(s.handle(SessionAction::PickLevel(2)), Err(SessionError::LevelLocked(2))));
        assert!(matches!(s.handle(SessionAction::PickLevel(0)), Err(SessionError::LevelLocked(0))));
        assert_eq!(s.screen(), Screen::LevelSelect);

        let entries = s.level_select_entries();
        assert_eq!(entries.len(), 6);
        assert!(!entries[0].locked);
        assert!(entries[1..].iter().all(|e| e.locked));
    }

    #[test]
    fn test_pick_level_starts_fresh_runtime() {
        let mut s = session();
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        assert_eq!(s.handle(SessionAction::PickLevel(1)).unwrap(), Screen::Playing);

        let rt = s.runtime().unwrap();
        assert_eq!(rt.level_index(), 1);
        assert_eq!(rt.tick_count(), 0);
        assert_eq!(rt.player().lives, 6);
    }

    #[test]
    fn test_sprite_catalog_feeds_frame_table() {
        use crate::game::animation::{AnimState, FrameRef, NoSprites};

        let mut s = session().with_sprites(Box::new(NoSprites));
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();

        let frames = s.runtime().unwrap().frames();
        assert_eq!(frames.frames(AnimState::Run), &[FrameRef::PLACEHOLDER]);
    }

    #[test]
    fn test_broken_level_falls_back_to_level_select() {
        let mut levels = MemoryLevelSource::new();
        levels.insert_json(1, r#####"{"tile_size": 32, "tiles": ["....", "####"]}"#####);
        let mut s = session_with(ShopStore::in_memory(), levels, SessionConfig::default());

        s.handle(SessionAction::OpenLevelSelect).unwrap();
        let err = s.handle(SessionAction::PickLevel(1)).unwrap_err();
        assert!(matches!(err, SessionError::LevelUnavailable { index: 1, .. }));
        assert_eq!(s.screen(), Screen::LevelSelect);
        assert!(s.runtime().is_none());
    }

    #[test]
    fn test_pause_and_resume_keep_the_level() {
        let mut s = session();
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();
        s.tick(InputFrame::new());
        s.tick(InputFrame::new());

        assert_eq!(s.handle(SessionAction::Back).unwrap(), Screen::Pause);
        // Ticks while paused do nothing
        s.tick(InputFrame::right());
        assert_eq!(s.runtime().unwrap().tick_count(), 2);

        assert_eq!(s.handle(SessionAction::Resume).unwrap(), Screen::Playing);
        assert_eq!(s.runtime().unwrap().tick_count(), 2);

        s.handle(SessionAction::Pause).unwrap();
        assert_eq!(s.handle(SessionAction::ToMenu).unwrap(), Screen::Menu);
        assert!(s.runtime().is_none());
    }

    #[test]
    fn test_win_unlocks_and_starts_next_level() {
        let mut s = session();
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();

        tick_until_screen_changes(&mut s, InputFrame::right(), 60);
        assert_eq!(s.screen(), Screen::Playing);
        assert_eq!(s.level_index(), 2);
        assert_eq!(s.shop().max_unlocked_level(), 2);
        assert_eq!(s.runtime().unwrap().tick_count(), 0);
    }

    #[test]
    fn test_win_on_last_available_level_returns_to_select() {
        let levels = MemoryLevelSource::new().with_rows(1, 32, &["PG", "##"]);
        let mut s = session_with(ShopStore::in_memory(), levels, SessionConfig::default());
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();

        assert_eq!(tick_until_screen_changes(&mut s, InputFrame::right(), 60), Screen::LevelSelect);
        assert_eq!(s.shop().max_unlocked_level(), 2);
        assert!(s.runtime().is_none());
    }

    #[test]
    fn test_replaying_old_level_does_not_unlock() {
        let shop = ShopStore::with_state(ShopState { max_level: 3, ..ShopState::default() });
        let mut s = session_with(shop, levels(), SessionConfig::default());
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();

        tick_until_screen_changes(&mut s, InputFrame::right(), 60);
        assert_eq!(s.level_index(), 2);
        assert_eq!(s.shop().max_unlocked_level(), 3);
    }

    #[test]
    fn test_death_then_replay() {
        let config = SessionConfig {
            runtime: RuntimeConfig {
                physics: PhysicsConfig { starting_lives: 1, ..PhysicsConfig::default() },
                ..RuntimeConfig::default()
            },
            ..SessionConfig::default()
        };
        let shop = ShopStore::with_state(ShopState { max_level: 3, ..ShopState::default() });
        let mut s = session_with(shop, levels(), config);
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(3)).unwrap();

        assert_eq!(tick_until_screen_changes(&mut s, InputFrame::new(), 200), Screen::GameOver);
        assert!(s.runtime().unwrap().is_finished());
        assert!(matches!(s.handle(SessionAction::Resume), Err(SessionError::InvalidTransition { .. })));

        assert_eq!(s.handle(SessionAction::Replay).unwrap(), Screen::Playing);
        let rt = s.runtime().unwrap();
        assert_eq!(rt.level_index(), 3);
        assert_eq!(rt.tick_count(), 0);
        assert!(!rt.is_finished());
    }

    #[test]
    fn test_coins_reach_the_shop() {
        let levels = MemoryLevelSource::new().with_rows(1, 32, &["PC..G", "#####"]);
        let mut s = session_with(ShopStore::in_memory(), levels, SessionConfig::default());
        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();

        tick_until_screen_changes(&mut s, InputFrame::right(), 120);
        assert_eq!(s.shop().coins(), 1);
    }

    #[test]
    fn test_shop_actions() {
        let shop = ShopStore::with_state(ShopState { coins: 60, ..ShopState::default() });
        let mut s = session_with(shop, levels(), SessionConfig::default());

        s.handle(SessionAction::OpenShop).unwrap();
        s.handle(SessionAction::BuySkin("nhanvat4".into())).unwrap();
        s.handle(SessionAction::EquipSkin("nhanvat4".into())).unwrap();
        assert_eq!(s.shop().coins(), 10);
        assert_eq!(s.shop().equipped_skin(), "nhanvat4");

        // Not enough coins for a second skin
        s.handle(SessionAction::BuySkin("nhanvat2".into())).unwrap();
        assert_eq!(s.shop().coins(), 10);
        assert_eq!(s.screen(), Screen::Shop);
        s.handle(SessionAction::Back).unwrap();
        assert!(s.handle(SessionAction::BuySkin("nhanvat3".into())).is_err());
    }

    #[test]
    fn test_music_and_cues() {
        let audio = SharedAudio::default();
        let log = audio.0.clone();
        let mut s = session().with_audio(Box::new(audio));

        s.handle(SessionAction::OpenLevelSelect).unwrap();
        s.handle(SessionAction::PickLevel(1)).unwrap();
        for _ in 0..6 {
            s.tick(InputFrame::jump());
        }
        s.handle(SessionAction::Pause).unwrap();
        s.handle(SessionAction::ToMenu).unwrap();

        let played = log.borrow();
        assert_eq!(played[0], Played::Music(MusicTrack::Menu));
        assert!(played.contains(&Played::Stop));
        assert!(played.contains(&Played::Music(MusicTrack::Level(1))));
        assert!(played.contains(&Played::Cue(SoundCue::Jump)));
        assert_eq!(played.last(), Some(&Played::Music(MusicTrack::Menu)));
    }
}
