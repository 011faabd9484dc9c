use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Canonical number of grid columns.
pub const GRID_COLUMNS: u32 = 12;

/// Rows available to a widget; `y + h` never exceeds this.
pub const MAX_ROWS: u32 = 10_000;

fn default_version() -> u32 {
    1
}

fn default_name() -> String {
    "My Dashboard".into()
}

fn default_config() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Grid,
    List,
    Compact,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Grid => "grid",
            LayoutMode::List => "list",
            LayoutMode::Compact => "compact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Some(LayoutMode::Grid),
            "list" => Some(LayoutMode::List),
            "compact" => Some(LayoutMode::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

/// Width and height of a widget in grid units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Footprint {
    pub w: u32,
    pub h: u32,
}

impl Footprint {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Grid rectangle, expressed in column/row units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Position {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn at_origin(footprint: Footprint) -> Self {
        Self::new(0, 0, footprint.w, footprint.h)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_sized(&self) -> bool {
        self.w >= 1 && self.h >= 1
    }

    /// Sized and within the row range of the grid.
    pub fn is_placeable(&self) -> bool {
        self.is_sized() && self.h <= MAX_ROWS && self.y <= MAX_ROWS - self.h
    }
}

/// One placed occurrence of a widget type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    pub id: String,
    pub type_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_config")]
    pub config: Value,
    #[serde(default)]
    pub position: Position,
}

/// Computed placement for one widget instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub instance_id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutEntry {
    pub fn new(instance_id: impl Into<String>, position: Position) -> Self {
        Self {
            instance_id: instance_id.into(),
            x: position.x,
            y: position.y,
            w: position.w,
            h: position.h,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y, self.w, self.h)
    }
}

/// Full dashboard state owned by the instance store.
///
/// `dirty` is session-local and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<WidgetInstance>,
    #[serde(default)]
    pub layout: Vec<LayoutEntry>,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub theme: Theme,
    #[serde(skip)]
    pub dirty: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            widgets: Vec::new(),
            layout: Vec::new(),
            layout_mode: LayoutMode::default(),
            theme: Theme::default(),
            dirty: false,
        }
    }
}

impl DashboardState {
    pub fn widget(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn layout_entry(&self, id: &str) -> Option<&LayoutEntry> {
        self.layout.iter().find(|e| e.instance_id == id)
    }

    /// True when every widget has exactly one layout entry and no entry is orphaned.
    pub fn layout_matches_widgets(&self) -> bool {
        if self.layout.len() != self.widgets.len() {
            return false;
        }
        let widget_ids: HashSet<&str> = self.widgets.iter().map(|w| w.id.as_str()).collect();
        let layout_ids: HashSet<&str> = self
            .layout
            .iter()
            .map(|e| e.instance_id.as_str())
            .collect();
        widget_ids == layout_ids && widget_ids.len() == self.widgets.len()
    }

    /// Equality of the persisted content, ignoring the session-local dirty flag.
    pub fn same_content(&self, other: &DashboardState) -> bool {
        self.version == other.version
            && self.name == other.name
            && self.widgets == other.widgets
            && self.layout == other.layout
            && self.layout_mode == other.layout_mode
            && self.theme == other.theme
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh widget instance id.
///
/// Combines a millisecond timestamp, a process-wide counter and a random
/// suffix so ids are never reused within or across sessions.
pub fn new_instance_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("w-{millis:x}-{seq:x}-{}", suffix.to_lowercase())
}
