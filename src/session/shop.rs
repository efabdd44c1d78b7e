//! Shop and Save Data
//!
//! Wallet, unlocked-level progress and character skins. The runtime and
//! session only see the `Shop` trait; `ShopStore` is the JSON-backed
//! implementation. Persistence never fails outward: errors are logged and
//! the in-memory state carries on.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Skins on sale, in display order.
pub const SKINS: [&str; 4] = ["nhanvat1", "nhanvat2", "nhanvat3", "nhanvat4"];

/// Price of every skin.
pub const SKIN_PRICE: u32 = 50;

/// Skin every new save starts with.
pub const DEFAULT_SKIN: &str = "nhanvat1";

/// Save-file failure. Only ever logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a purchase attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseResult {
    Purchased,
    AlreadyOwned,
    InsufficientCoins,
    UnknownSkin,
}

/// Progress and wallet collaborator used by the runtime and session.
pub trait Shop {
    /// Skin the player character is drawn with.
    fn equipped_skin(&self) -> &str;

    /// Add to the persistent wallet.
    fn add_coin(&mut self, amount: u32);

    /// Called after finishing `current`; unlocks `current + 1` only when
    /// `current` is the highest unlocked level.
    fn unlock_next_level(&mut self, current: u32);

    /// Highest playable level index.
    fn max_unlocked_level(&self) -> u32;

    /// Wallet balance.
    fn coins(&self) -> u32;

    fn buy_skin(&mut self, skin: &str) -> PurchaseResult;

    /// Equip an owned skin. Returns false if not owned.
    fn equip_skin(&mut self, skin: &str) -> bool;
}

// =============================================================================
// STATE
// =============================================================================

/// Persisted shop data. Missing keys take their defaults on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopState {
    pub coins: u32,
    pub max_level: u32,
    pub owned_skins: BTreeSet<String>,
    pub equipped_skin: String,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            coins: 0,
            max_level: 1,
            owned_skins: BTreeSet::from([DEFAULT_SKIN.to_string()]),
            equipped_skin: DEFAULT_SKIN.to_string(),
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// `Shop` backed by an optional JSON save file.
#[derive(Clone, Debug)]
pub struct ShopStore {
    state: ShopState,
    path: Option<PathBuf>,
}

impl ShopStore {
    /// Shop with default state and no save file.
    pub fn in_memory() -> Self {
        Self { state: ShopState::default(), path: None }
    }

    /// Shop with a given starting state and no save file.
    pub fn with_state(state: ShopState) -> Self {
        Self { state, path: None }
    }

    /// Load from `path`. A missing file is created with defaults; an
    /// unreadable one is logged and replaced by defaults in memory.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self { state: ShopState::default(), path: Some(path.clone()) };

        if !path.exists() {
            debug!(path = %path.display(), "no save file, writing defaults");
            store.save();
            return store;
        }

        match read_state(&path) {
            Ok(state) => store.state = state,
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load save file, using defaults"),
        }
        store
    }

    pub fn state(&self) -> &ShopState {
        &self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `skin` is owned.
    pub fn owns(&self, skin: &str) -> bool {
        self.state.owned_skins.contains(skin)
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_state(path, &self.state) {
            warn!(path = %path.display(), error = %e, "failed to write save file");
        }
    }
}

impl Shop for ShopStore {
    fn equipped_skin(&self) -> &str {
        &self.state.equipped_skin
    }

    fn add_coin(&mut self, amount: u32) {
        self.state.coins = self.state.coins.saturating_add(amount);
        self.save();
    }

    fn unlock_next_level(&mut self, current: u32) {
        if current == self.state.max_level {
            self.state.max_level += 1;
            debug!(max_level = self.state.max_level, "level unlocked");
            self.save();
        }
    }

    fn max_unlocked_level(&self) -> u32 {
        self.state.max_level
    }

    fn coins(&self) -> u32 {
        self.state.coins
    }

    fn buy_skin(&mut self, skin: &str) -> PurchaseResult {
        if !SKINS.contains(&skin) {
            return PurchaseResult::UnknownSkin;
        }
        if self.owns(skin) {
            return PurchaseResult::AlreadyOwned;
        }
        if self.state.coins < SKIN_PRICE {
            return PurchaseResult::InsufficientCoins;
        }

        self.state.coins -= SKIN_PRICE;
        self.state.owned_skins.insert(skin.to_string());
        self.save();
        PurchaseResult::Purchased
    }

    fn equip_skin(&mut self, skin: &str) -> bool {
        if !self.owns(skin) {
            return false;
        }
        self.state.equipped_skin = skin.to_string();
        self.save();
        true
    }
}

// =============================================================================
// FILE I/O
// =============================================================================

fn read_state(path: &Path) -> Result<ShopState, PersistenceError> {
    let text = fs::read_to_string(path)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(serde_json::from_str(text)?)
}

fn write_state(path: &Path, state: &ShopState) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(state)?;
    write_atomic(path, &json)?;
    Ok(())
}

/// Write through a sibling temp file and rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;

    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save.json");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
