// Application Catalog
//
// *Le Catalogue* (The Catalog) - Heavy/light foreground application table

use lemotif::normalize_app;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Applications that usually need sustained performance
pub const DEFAULT_HEAVY_APPS: &[&str] = &[
    "steam.exe",
    "steamwebhelper.exe",
    "epicgameslauncher.exe",
    "premiere pro.exe",
    "afterfx.exe",
    "davinci resolve.exe",
    "blender.exe",
    "maya.exe",
    "3dsmax.exe",
    "devenv.exe",
    "rider64.exe",
];

/// Applications that run comfortably on a reduced power budget
pub const DEFAULT_LIGHT_APPS: &[&str] = &[
    "notepad.exe",
    "notepad++.exe",
    "winword.exe",
    "wmplayer.exe",
    "vlc.exe",
    "spotify.exe",
    "explorer.exe",
    "searchhost.exe",
];

/// Load category of a foreground application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    /// Listed in the heavy set
    Heavy,
    /// Listed in the light set
    Light,
    /// Not listed
    Normal,
}

/// Case-insensitive heavy/light application sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCatalog {
    heavy: HashSet<String>,
    light: HashSet<String>,
}

impl Default for AppCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_HEAVY_APPS.iter().copied(), DEFAULT_LIGHT_APPS.iter().copied())
    }
}

impl AppCatalog {
    /// Build a catalog from explicit lists; names are normalized
    pub fn new<H, L, S, T>(heavy: H, light: L) -> Self
    where
        H: IntoIterator<Item = S>,
        L: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            heavy: heavy.into_iter().map(|a| normalize_app(a.as_ref())).collect(),
            light: light.into_iter().map(|a| normalize_app(a.as_ref())).collect(),
        }
    }

    /// Whether `app` is in the heavy set
    pub fn is_heavy(&self, app: &str) -> bool {
        self.heavy.contains(&normalize_app(app))
    }

    /// Whether `app` is in the light set
    pub fn is_light(&self, app: &str) -> bool {
        self.light.contains(&normalize_app(app))
    }

    /// Categorize an application; heavy wins when listed in both sets
    pub fn categorize(&self, app: &str) -> AppCategory {
        let app = normalize_app(app);
        if self.heavy.contains(&app) {
            AppCategory::Heavy
        } else if self.light.contains(&app) {
            AppCategory::Light
        } else {
            AppCategory::Normal
        }
    }
}
