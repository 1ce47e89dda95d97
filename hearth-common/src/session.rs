//! Persisted session store
//!
//! Holds the small amount of per-user state the organizer keeps between
//! runs: demo mode, the selected test account, widget visibility and a
//! short history of posts. The state is an ordinary value owned by the
//! caller; [`SessionStore`] only loads, saves and clears it.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Maximum number of cached posts kept, newest first
pub const POST_HISTORY_LIMIT: usize = 50;

/// Session file name inside the root folder
pub const SESSION_FILE_NAME: &str = "session.json";

/// Dashboard panel whose visibility the user controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    ShoppingList,
    Calendar,
    Tasks,
    MealPlan,
    Goals,
    Trips,
    Weather,
    Chores,
}

impl Widget {
    pub const ALL: [Widget; 8] = [
        Widget::ShoppingList,
        Widget::Calendar,
        Widget::Tasks,
        Widget::MealPlan,
        Widget::Goals,
        Widget::Trips,
        Widget::Weather,
        Widget::Chores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::ShoppingList => "shopping_list",
            Widget::Calendar => "calendar",
            Widget::Tasks => "tasks",
            Widget::MealPlan => "meal_plan",
            Widget::Goals => "goals",
            Widget::Trips => "trips",
            Widget::Weather => "weather",
            Widget::Chores => "chores",
        }
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Widget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Widget::ALL
            .into_iter()
            .find(|w| w.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown widget: {}", s.trim())))
    }
}

/// Widget visibility; widgets never configured are visible
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetSettings(BTreeMap<Widget, bool>);

impl WidgetSettings {
    pub fn is_visible(&self, widget: Widget) -> bool {
        self.0.get(&widget).copied().unwrap_or(true)
    }

    pub fn set_visible(&mut self, widget: Widget, visible: bool) {
        self.0.insert(widget, visible);
    }

    pub fn visible_widgets(&self) -> Vec<Widget> {
        Widget::ALL
            .into_iter()
            .filter(|w| self.is_visible(*w))
            .collect()
    }
}

/// Post kept in the local history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPost {
    pub id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CachedPost {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            created_at: crate::time::now(),
        }
    }
}

/// Everything persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub demo_mode: bool,
    #[serde(default)]
    pub test_account: Option<String>,
    #[serde(default)]
    pub widgets: WidgetSettings,
    #[serde(default)]
    pub post_history: Vec<CachedPost>,
}

impl SessionState {
    /// Record a post at the front of the history, dropping the oldest past the limit
    pub fn push_post(&mut self, post: CachedPost) {
        self.post_history.insert(0, post);
        self.post_history.truncate(POST_HISTORY_LIMIT);
    }
}

/// Load/save/clear lifecycle for [`SessionState`] at a fixed path
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<root_folder>/session.json`
    pub fn in_root_folder(root_folder: &Path) -> Self {
        Self::new(root_folder.join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state; a missing file yields defaults
    pub fn load(&self) -> Result<SessionState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No session file at {}, starting fresh", self.path.display());
                return Ok(SessionState::default());
            }
            Err(e) => return Err(e.into()),
        };
        let state = serde_json::from_str(&content)?;
        debug!("Loaded session from {}", self.path.display());
        Ok(state)
    }

    /// Write the state atomically (temp file + rename)
    pub fn save(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored state; absent file is not an error
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared session at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `contents` to `target` via `<target>.tmp` and a rename.
///
/// Parent directories are created. On Unix the file is left with mode 0600.
pub(crate) fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = target
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("not a file path: {}", target.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = target.with_file_name(temp_name);

    std::fs::write(&temp_path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, target) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
