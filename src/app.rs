use adw::Application;
use adw::prelude::*;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted session context: which server we talk to and, once logged in,
/// the bearer token and identity. Loaded once per shell build and passed
/// into the windows explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppState {
    pub base_url: String,
    pub username: String,
    pub token: Option<String>,
}

impl AppState {
    fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("brainbot.toml"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| toml::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> std::io::Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config dir",
            )),
        }
    }

    fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        fs::write(path, toml)
    }

    pub fn logged_in(&self) -> bool {
        !self.base_url.is_empty() && self.token.is_some()
    }

    /// Drop credential and identity; the server address is kept so the
    /// login form comes back prefilled.
    pub fn clear_session(&mut self) {
        self.token = None;
        self.username.clear();
    }
}

pub fn build_ui(app: &Application) {
    let state = AppState::load();
    if state.logged_in() {
        crate::ui::main_window::show_main_window(app, state);
    } else {
        crate::ui::login::show_login_window(app, state);
    }
}

/// The server answered 401/403: the stored credential is dead. Tear the
/// session down and put the whole shell back at the login screen. No
/// distinction is made between an expired token and missing permission.
pub fn handle_auth_failure(app: &Application) {
    let mut state = AppState::load();
    if state.token.is_none() {
        // A concurrent request already tore the session down.
        return;
    }
    state.clear_session();
    if let Err(err) = state.save() {
        log::warn!("failed to persist session teardown: {err}");
    }
    restart_shell(app, state);
}

/// User-initiated variant of the same teardown.
pub fn logout(app: &Application) {
    let mut state = AppState::load();
    state.clear_session();
    if let Err(err) = state.save() {
        log::warn!("failed to persist logout: {err}");
    }
    restart_shell(app, state);
}

fn restart_shell(app: &Application, state: AppState) {
    let stale = app.windows();
    crate::ui::login::show_login_window(app, state);
    for window in stale {
        window.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_file_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("brainbot.toml");
        let state = AppState {
            base_url: "https://bot.example.com".into(),
            username: "admin".into(),
            token: Some("tok123".into()),
        };
        state.save_to(&path).unwrap();

        let loaded = AppState::load_from(&path);
        assert_eq!(loaded.base_url, state.base_url);
        assert_eq!(loaded.username, state.username);
        assert_eq!(loaded.token.as_deref(), Some("tok123"));
        assert!(loaded.logged_in());
    }

    #[test]
    fn missing_file_loads_as_logged_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let loaded = AppState::load_from(&dir.path().join("absent.toml"));
        assert!(loaded.base_url.is_empty());
        assert!(!loaded.logged_in());
    }

    #[test]
    fn clear_session_drops_token_and_identity_but_keeps_server() {
        let mut state = AppState {
            base_url: "https://bot.example.com".into(),
            username: "admin".into(),
            token: Some("tok123".into()),
        };
        state.clear_session();
        assert!(state.token.is_none());
        assert!(state.username.is_empty());
        assert_eq!(state.base_url, "https://bot.example.com");
        assert!(!state.logged_in());
    }
}
