use std::fmt;

use tracing::warn;

use crate::storage::LocalStorage;

const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light/dark preference, stored next to the session
#[derive(Debug, Clone)]
pub struct ThemeStore {
    storage: LocalStorage,
}

impl ThemeStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Anything other than "dark" is light
    pub fn load(&self) -> Theme {
        match self.storage.get_item(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn save(&self, theme: Theme) {
        if let Err(e) = self.storage.set_item(THEME_KEY, theme.as_str()) {
            warn!("Failed to persist theme preference: {}", e);
        }
    }

    pub fn toggle(&self) -> Theme {
        let next = self.load().toggled();
        self.save(next);
        next
    }
}
