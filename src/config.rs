use crate::error::ConfigError;
use crate::models::SortOrder;
use crate::swipe::{self, SwipeConfig};
use crate::undo::MailAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub swipe: SwipeSettings,
    #[serde(default)]
    pub view: ViewSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub next_panel: Vec<String>,
    pub prev_panel: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub open: Vec<String>,
    pub filter_unread: Vec<String>,
    pub filter_starred: Vec<String>,
    pub filter_attachments: Vec<String>,
    pub filter_unanswered: Vec<String>,
    pub filter_favorites: Vec<String>,
    pub filter_personal: Vec<String>,
    pub filter_social: Vec<String>,
    pub filter_updates: Vec<String>,
    pub filter_forums: Vec<String>,
    pub clear_filters: Vec<String>,
    pub cycle_sort: Vec<String>,
    pub flip_sort: Vec<String>,
    pub next_category: Vec<String>,
    pub selection_mode: Vec<String>,
    pub toggle_select: Vec<String>,
    pub undo: Vec<String>,
    pub quit: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            next_panel: keys(&["l", "Right", "Tab"]),
            prev_panel: keys(&["h", "Left", "BackTab"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            open: keys(&["Enter"]),
            filter_unread: keys(&["1"]),
            filter_starred: keys(&["2"]),
            filter_attachments: keys(&["3"]),
            filter_unanswered: keys(&["4"]),
            filter_favorites: keys(&["5"]),
            filter_personal: keys(&["6"]),
            filter_social: keys(&["7"]),
            filter_updates: keys(&["8"]),
            filter_forums: keys(&["9"]),
            clear_filters: keys(&["0"]),
            cycle_sort: keys(&["s"]),
            flip_sort: keys(&["S"]),
            next_category: keys(&["c"]),
            selection_mode: keys(&["v"]),
            toggle_select: keys(&[" "]),
            undo: keys(&["u"]),
            quit: keys(&["q"]),
        }
    }
}

/// Swipe parameters in device-independent pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeSettings {
    pub threshold: f32,
    pub item_width: f32,
    pub jitter: f32,
    pub damping: f32,
    /// Pixels represented by one terminal column.
    pub column_width: f32,
    pub right_actions: Vec<MailAction>,
    pub left_actions: Vec<MailAction>,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            threshold: swipe::SWIPE_THRESHOLD,
            item_width: swipe::ACTION_ITEM_WIDTH,
            jitter: swipe::JITTER_THRESHOLD,
            damping: swipe::OVERDRAG_DAMPING,
            column_width: 8.0,
            right_actions: vec![MailAction::ToggleRead, MailAction::ToggleFlag],
            left_actions: vec![MailAction::Archive, MailAction::Delete],
        }
    }
}

impl SwipeSettings {
    pub fn controller_config(&self) -> SwipeConfig {
        SwipeConfig {
            threshold: self.threshold,
            item_width: self.item_width,
            jitter: self.jitter,
            damping: self.damping,
            right_actions: self.right_actions.len(),
            left_actions: self.left_actions.len(),
        }
    }

    pub fn columns_to_px(&self, columns: f32) -> f32 {
        columns * self.column_width
    }

    pub fn px_to_columns(&self, px: f32) -> i32 {
        (px / self.column_width).round() as i32
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub default_sort: SortOrder,
}

pub fn parse_key_string(key_str: &str) -> (KeyCode, KeyModifiers) {
    // "-" alone is a key, not a separator
    let (prefix, base) = match key_str.rsplit_once('-') {
        Some((p, b)) if !b.is_empty() => (Some(p), b),
        _ => (None, key_str),
    };

    let mut modifiers = KeyModifiers::empty();
    for part in prefix.into_iter().flat_map(|p| p.split('-')) {
        match part.to_lowercase().as_str() {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "cmd" | "command" | "super" => modifiers.insert(KeyModifiers::SUPER),
            "meta" => modifiers.insert(KeyModifiers::META),
            _ => {}
        }
    }

    let code = match base {
        "Backspace" => KeyCode::Backspace,
        "Enter" => KeyCode::Enter,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Tab" => KeyCode::Tab,
        "BackTab" => KeyCode::BackTab,
        "Esc" => KeyCode::Esc,
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Null,
            }
        }
    };

    (code, modifiers)
}

pub fn matches_key(event: KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| {
        let (code, modifiers) = parse_key_string(b);
        event.code == code && event.modifiers.contains(modifiers)
    })
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.swipe.controller_config().validate()?;
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `settings.toml`, falling back to defaults when absent or invalid.
    pub fn load() -> Self {
        match Self::load_from(SETTINGS_FILE) {
            Ok(config) => {
                tracing::info!(path = SETTINGS_FILE, "loaded settings");
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no {} found, using defaults", SETTINGS_FILE);
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring {}", SETTINGS_FILE);
                Self::default()
            }
        }
    }
}
