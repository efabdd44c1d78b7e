//! Session Layer
//!
//! Everything around a running level: screens and transitions, the coin
//! shop with its save file, and audio cue dispatch. Unlike `game/`, this
//! layer touches the filesystem and is not part of replay verification.

pub mod audio;
pub mod machine;
pub mod shop;

pub use audio::{AudioSink, MusicTrack, NullAudio, SoundCue};
pub use machine::{LevelEntry, Screen, Session, SessionAction, SessionConfig, SessionError};
pub use shop::{PurchaseResult, Shop, ShopState, ShopStore};
