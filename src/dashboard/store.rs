use crate::dashboard::config::{default_template, sanitize};
use crate::dashboard::layout::{clamp_position, compute_layout, compute_layout_for, grid_bottom};
use crate::dashboard::model::{
    DashboardState, LayoutEntry, LayoutMode, Position, Role, Theme, WidgetInstance, GRID_COLUMNS,
    MAX_ROWS,
};
use crate::dashboard::widgets::{merge_json, WidgetRegistry};
use crate::session::Session;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownWidgetType(String),
    RoleNotAllowed { type_id: String, role: Role },
    InvalidGeometry { y: u32, w: u32, h: u32 },
    NotInGridMode(LayoutMode),
    NotBindable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UnknownWidgetType(t) => write!(f, "unknown widget type '{t}'"),
            StoreError::RoleNotAllowed { type_id, role } => {
                write!(f, "widget type '{type_id}' is not available for role '{role}'")
            }
            StoreError::InvalidGeometry { y, w, h } => write!(
                f,
                "invalid widget geometry {w}x{h} at row {y}: sizes start at 1 and the widget must end by row {MAX_ROWS}"
            ),
            StoreError::NotInGridMode(mode) => write!(
                f,
                "manual positions can only be set in grid mode (current: {})",
                mode.as_str()
            ),
            StoreError::NotBindable(id) => write!(f, "widget '{id}' has no binding to set"),
        }
    }
}

impl std::error::Error for StoreError {}

/// How `update_widget_config` combines the new config with the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdate {
    Replace,
    /// Top-level keys of the new config overwrite the old ones; other keys survive.
    Merge,
}

/// Caller-supplied values applied on top of the registry defaults.
#[derive(Debug, Clone, Default)]
pub struct WidgetOverrides {
    pub title: Option<String>,
    pub config: Option<Value>,
    /// Id of the entity written into the type's binding key.
    pub binding: Option<String>,
    pub position: Option<Position>,
}

impl WidgetOverrides {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn bound_to(entity_id: &str) -> Self {
        Self {
            binding: Some(entity_id.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedWidget {
    pub id: String,
    /// Set when the type needs a binding that was not supplied.
    pub needs_configuration: bool,
}

/// Authoritative in-session owner of the dashboard state.
///
/// Every mutation bumps `revision` and sets `dirty`; only `replace_all` and a
/// confirmed save clear it again.
pub struct DashboardStore {
    registry: Arc<WidgetRegistry>,
    role: Role,
    state: DashboardState,
    revision: u64,
    needs_configuration: HashSet<String>,
}

impl DashboardStore {
    pub fn new(registry: Arc<WidgetRegistry>, session: &Session) -> Self {
        Self {
            registry,
            role: session.role,
            state: DashboardState {
                theme: session.theme,
                ..DashboardState::default()
            },
            revision: 0,
            needs_configuration: HashSet::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn widgets(&self) -> &[WidgetInstance] {
        &self.state.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetInstance> {
        self.state.widget(id)
    }

    pub fn layout(&self) -> &[LayoutEntry] {
        &self.state.layout
    }

    /// Layout for a narrower breakpoint; the stored layout stays canonical.
    pub fn layout_for(&self, columns: u32) -> Vec<LayoutEntry> {
        compute_layout_for(
            self.state.layout_mode,
            &self.state.widgets,
            &self.registry,
            columns,
        )
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.state.layout_mode
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    pub fn needs_configuration(&self, id: &str) -> bool {
        self.needs_configuration.contains(id)
    }

    /// Ids of widgets waiting for a binding, in widget order.
    pub fn pending_configuration(&self) -> Vec<String> {
        self.state
            .widgets
            .iter()
            .filter(|w| self.needs_configuration.contains(&w.id))
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn add_widget(
        &mut self,
        type_id: &str,
        overrides: WidgetOverrides,
    ) -> Result<AddedWidget, StoreError> {
        let descriptor = self
            .registry
            .descriptor(type_id)
            .ok_or_else(|| StoreError::UnknownWidgetType(type_id.to_string()))?;
        if !descriptor.allows(self.role) {
            return Err(StoreError::RoleNotAllowed {
                type_id: type_id.to_string(),
                role: self.role,
            });
        }
        if let Some(p) = overrides.position {
            if !p.is_placeable() {
                return Err(StoreError::InvalidGeometry { y: p.y, w: p.w, h: p.h });
            }
        }
        let mut instance = self
            .registry
            .default_instance_for(type_id)
            .ok_or_else(|| StoreError::UnknownWidgetType(type_id.to_string()))?;

        if let Some(title) = overrides.title.filter(|t| !t.trim().is_empty()) {
            instance.title = title;
        }
        if let Some(config) = overrides.config {
            instance.config = merge_json(&instance.config, &config);
        }
        if let (Some(binding), Some(entity_id)) = (descriptor.binding(), overrides.binding) {
            instance.config[binding.key] = Value::String(entity_id);
        }
        instance.position = match overrides.position {
            Some(p) => clamp_position(p, GRID_COLUMNS),
            None => {
                let mut p = instance.position;
                p.y = grid_bottom(&self.state.widgets);
                clamp_position(p, GRID_COLUMNS)
            }
        };

        let needs_configuration = !descriptor.is_bound(&instance.config);
        let id = instance.id.clone();
        if needs_configuration {
            self.needs_configuration.insert(id.clone());
        }
        tracing::debug!(instance_id = %id, type_id, needs_configuration, "widget added");
        self.state.widgets.push(instance);
        self.touch();
        Ok(AddedWidget {
            id,
            needs_configuration,
        })
    }

    /// Remove a widget and its layout entry. Removing an absent id is a no-op.
    pub fn remove_widget(&mut self, id: &str) -> bool {
        let before = self.state.widgets.len();
        self.state.widgets.retain(|w| w.id != id);
        if self.state.widgets.len() == before {
            return false;
        }
        self.needs_configuration.remove(id);
        tracing::debug!(instance_id = %id, "widget removed");
        self.touch();
        true
    }

    pub fn update_widget_config(&mut self, id: &str, config: Value, mode: ConfigUpdate) -> bool {
        let Some(widget) = self.state.widgets.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        widget.config = match mode {
            ConfigUpdate::Replace => config,
            ConfigUpdate::Merge => merge_json(&widget.config, &config),
        };
        tracing::debug!(instance_id = %id, ?mode, "widget config updated");
        self.refresh_configuration_flag(id);
        self.touch();
        true
    }

    /// Blank titles are ignored.
    pub fn rename_widget(&mut self, id: &str, title: &str) -> bool {
        if title.trim().is_empty() {
            return false;
        }
        let Some(widget) = self.state.widgets.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        if widget.title == title {
            return false;
        }
        widget.title = title.to_string();
        tracing::debug!(instance_id = %id, title, "widget renamed");
        self.touch();
        true
    }

    /// Write `entity_id` into the widget's binding key.
    pub fn bind_widget(&mut self, id: &str, entity_id: &str) -> Result<bool, StoreError> {
        let Some(widget) = self.state.widget(id) else {
            return Ok(false);
        };
        let binding = self
            .registry
            .descriptor(&widget.type_id)
            .and_then(|d| d.binding())
            .ok_or_else(|| StoreError::NotBindable(id.to_string()))?;
        let mut update = serde_json::Map::new();
        update.insert(binding.key.to_string(), Value::String(entity_id.to_string()));
        Ok(self.update_widget_config(id, Value::Object(update), ConfigUpdate::Merge))
    }

    /// Set a manual Grid position. The width is clamped to the grid.
    pub fn set_layout_entry(&mut self, id: &str, position: Position) -> Result<bool, StoreError> {
        self.check_grid_geometry(&position)?;
        let changed = self.apply_position(id, position);
        if changed {
            tracing::debug!(instance_id = %id, ?position, "widget moved");
            self.touch();
        }
        Ok(changed)
    }

    /// Apply a batch of Grid positions, e.g. one drag/resize gesture. When an
    /// id appears more than once the last entry wins. Nothing is applied if
    /// any entry is invalid.
    pub fn apply_grid_layout(&mut self, entries: &[LayoutEntry]) -> Result<usize, StoreError> {
        for entry in entries {
            self.check_grid_geometry(&entry.position())?;
        }
        let mut changed = 0;
        for entry in entries {
            if self.apply_position(&entry.instance_id, entry.position()) {
                tracing::debug!(
                    instance_id = %entry.instance_id,
                    position = ?entry.position(),
                    "widget moved"
                );
                changed += 1;
            }
        }
        if changed > 0 {
            tracing::debug!(entries = entries.len(), changed, "grid layout applied");
            self.touch();
        }
        Ok(changed)
    }

    /// Move a widget to `to_index` in the widget order.
    pub fn reorder_widget(&mut self, id: &str, to_index: usize) -> bool {
        let Some(from) = self.state.widgets.iter().position(|w| w.id == id) else {
            return false;
        };
        let to = to_index.min(self.state.widgets.len() - 1);
        if from == to {
            return false;
        }
        let widget = self.state.widgets.remove(from);
        self.state.widgets.insert(to, widget);
        tracing::debug!(instance_id = %id, from, to, "widget reordered");
        self.touch();
        true
    }

    /// Switch layout strategy. Grid positions stay on the widgets, so going
    /// back to Grid restores the last manual arrangement.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) -> bool {
        if self.state.layout_mode == mode {
            return false;
        }
        tracing::debug!(from = self.state.layout_mode.as_str(), to = mode.as_str(), "layout mode changed");
        self.state.layout_mode = mode;
        self.touch();
        true
    }

    pub fn set_theme(&mut self, theme: Theme) -> bool {
        if self.state.theme == theme {
            return false;
        }
        tracing::debug!(from = self.state.theme.as_str(), to = theme.as_str(), "theme changed");
        self.state.theme = theme;
        self.touch();
        true
    }

    /// Overwrite the whole state (server load) and clear `dirty`.
    pub fn replace_all(&mut self, mut state: DashboardState) -> Vec<String> {
        let warnings = sanitize(&mut state, &self.registry);
        state.dirty = false;
        self.needs_configuration = state
            .widgets
            .iter()
            .filter(|w| {
                self.registry
                    .descriptor(&w.type_id)
                    .map(|d| !d.is_bound(&w.config))
                    .unwrap_or(false)
            })
            .map(|w| w.id.clone())
            .collect();
        self.state = state;
        self.revision += 1;
        tracing::info!(
            widgets = self.state.widgets.len(),
            mode = self.state.layout_mode.as_str(),
            "dashboard state replaced"
        );
        warnings
    }

    /// Overwrite the whole state with content the server has not seen yet
    /// (an import or a synthesized template); the result stays dirty.
    pub fn replace_all_unsaved(&mut self, state: DashboardState) -> Vec<String> {
        let warnings = self.replace_all(state);
        self.state.dirty = true;
        warnings
    }

    pub fn reset_to_template(&mut self) {
        let template = default_template(self.role, &self.registry);
        self.replace_all_unsaved(template);
    }

    /// Copy of the state tagged with the revision it was taken at.
    pub fn snapshot(&self) -> (u64, DashboardState) {
        (self.revision, self.state.clone())
    }

    /// Clear `dirty` after the server acknowledged `revision`. Edits made
    /// after that snapshot keep the store dirty.
    pub fn mark_saved(&mut self, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.state.dirty = false;
        true
    }

    fn check_grid_geometry(&self, position: &Position) -> Result<(), StoreError> {
        if self.state.layout_mode != LayoutMode::Grid {
            return Err(StoreError::NotInGridMode(self.state.layout_mode));
        }
        if !position.is_placeable() {
            return Err(StoreError::InvalidGeometry {
                y: position.y,
                w: position.w,
                h: position.h,
            });
        }
        Ok(())
    }

    fn apply_position(&mut self, id: &str, position: Position) -> bool {
        let Some(widget) = self.state.widgets.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        let clamped = clamp_position(position, GRID_COLUMNS);
        if widget.position == clamped {
            return false;
        }
        widget.position = clamped;
        true
    }

    fn refresh_configuration_flag(&mut self, id: &str) {
        let Some(widget) = self.state.widget(id) else {
            return;
        };
        let unbound = self
            .registry
            .descriptor(&widget.type_id)
            .map(|d| !d.is_bound(&widget.config))
            .unwrap_or(false);
        if unbound {
            self.needs_configuration.insert(id.to_string());
        } else {
            self.needs_configuration.remove(id);
        }
    }

    fn touch(&mut self) {
        self.state.layout = compute_layout(self.state.layout_mode, &self.state.widgets, &self.registry);
        self.state.dirty = true;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(role: Role) -> DashboardStore {
        DashboardStore::new(
            Arc::new(WidgetRegistry::with_defaults()),
            &Session::new("u-1", role),
        )
    }

    #[test]
    fn add_widget_appends_and_marks_dirty() {
        let mut s = store(Role::Member);
        assert!(!s.is_dirty());
        let added = s.add_widget("taskList", WidgetOverrides::titled("Mine")).unwrap();
        assert!(!added.needs_configuration);
        assert!(s.is_dirty());
        assert_eq!(s.widget(&added.id).unwrap().title, "Mine");
        assert!(s.state().layout_matches_widgets());
    }

    #[test]
    fn add_widget_rejects_unknown_and_forbidden_types() {
        let mut s = store(Role::Member);
        assert_eq!(
            s.add_widget("nope", WidgetOverrides::default()),
            Err(StoreError::UnknownWidgetType("nope".into()))
        );
        assert!(matches!(
            s.add_widget("analyticsChart", WidgetOverrides::default()),
            Err(StoreError::RoleNotAllowed { .. })
        ));
        assert!(s.widgets().is_empty());
        assert!(!s.is_dirty());
    }

    #[test]
    fn new_grid_widgets_are_placed_below_existing_ones() {
        let mut s = store(Role::Member);
        let a = s.add_widget("taskList", WidgetOverrides::default()).unwrap();
        let b = s.add_widget("notifications", WidgetOverrides::default()).unwrap();
        assert_eq!(s.widget(&a.id).unwrap().position, Position::new(0, 0, 6, 4));
        assert_eq!(s.widget(&b.id).unwrap().position, Position::new(0, 4, 4, 3));
    }

    #[test]
    fn binding_override_and_bind_widget() {
        let mut s = store(Role::Manager);
        let bound = s
            .add_widget("projectSummary", WidgetOverrides::bound_to("p-1"))
            .unwrap();
        assert!(!bound.needs_configuration);
        assert_eq!(s.widget(&bound.id).unwrap().config["projectId"], json!("p-1"));

        let unbound = s
            .add_widget("projectSummary", WidgetOverrides::default())
            .unwrap();
        assert!(unbound.needs_configuration);
        assert_eq!(s.pending_configuration(), vec![unbound.id.clone()]);
        assert_eq!(s.bind_widget(&unbound.id, "p-2"), Ok(true));
        assert!(!s.needs_configuration(&unbound.id));

        let list = s.add_widget("taskList", WidgetOverrides::default()).unwrap();
        assert_eq!(
            s.bind_widget(&list.id, "p-3"),
            Err(StoreError::NotBindable(list.id.clone()))
        );
        assert_eq!(s.bind_widget("missing", "p-3"), Ok(false));
    }

    #[test]
    fn config_update_modes() {
        let mut s = store(Role::Member);
        let id = s.add_widget("taskList", WidgetOverrides::default()).unwrap().id;
        assert!(s.update_widget_config(&id, json!({"limit": 3}), ConfigUpdate::Merge));
        let cfg = &s.widget(&id).unwrap().config;
        assert_eq!(cfg["limit"], json!(3));
        assert_eq!(cfg["status"], json!("open"));

        assert!(s.update_widget_config(&id, json!({"limit": 4}), ConfigUpdate::Replace));
        assert_eq!(s.widget(&id).unwrap().config, json!({"limit": 4}));

        let rev = s.revision();
        assert!(!s.update_widget_config("ghost", json!({}), ConfigUpdate::Replace));
        assert_eq!(s.revision(), rev);
    }

    #[test]
    fn set_layout_entry_validates_and_clamps() {
        let mut s = store(Role::Member);
        let id = s.add_widget("taskList", WidgetOverrides::default()).unwrap().id;
        assert_eq!(
            s.set_layout_entry(&id, Position::new(0, 0, 0, 2)),
            Err(StoreError::InvalidGeometry { y: 0, w: 0, h: 2 })
        );
        assert_eq!(s.set_layout_entry(&id, Position::new(9, 1, 6, 2)), Ok(true));
        assert_eq!(s.widget(&id).unwrap().position, Position::new(9, 1, 3, 2));
        assert_eq!(s.set_layout_entry(&id, Position::new(9, 1, 3, 2)), Ok(false));

        s.set_layout_mode(LayoutMode::List);
        assert_eq!(
            s.set_layout_entry(&id, Position::new(0, 0, 2, 2)),
            Err(StoreError::NotInGridMode(LayoutMode::List))
        );
    }

    #[test]
    fn batch_layout_last_write_wins_and_is_atomic() {
        let mut s = store(Role::Member);
        let id = s.add_widget("taskList", WidgetOverrides::default()).unwrap().id;
        let entries = vec![
            LayoutEntry::new(id.clone(), Position::new(1, 1, 2, 2)),
            LayoutEntry::new(id.clone(), Position::new(2, 2, 3, 3)),
        ];
        assert_eq!(s.apply_grid_layout(&entries), Ok(2));
        assert_eq!(s.widget(&id).unwrap().position, Position::new(2, 2, 3, 3));

        let bad = vec![
            LayoutEntry::new(id.clone(), Position::new(5, 5, 2, 2)),
            LayoutEntry::new(id.clone(), Position::new(0, 0, 0, 0)),
        ];
        assert!(s.apply_grid_layout(&bad).is_err());
        assert_eq!(s.widget(&id).unwrap().position, Position::new(2, 2, 3, 3));
    }

    #[test]
    fn layout_mode_change_only_dirties_on_change() {
        let mut s = store(Role::Member);
        s.replace_all(DashboardState::default());
        assert!(!s.set_layout_mode(LayoutMode::Grid));
        assert!(!s.is_dirty());
        assert!(s.set_layout_mode(LayoutMode::Compact));
        assert!(s.is_dirty());
    }

    #[test]
    fn reorder_changes_list_placement() {
        let mut s = store(Role::Member);
        let a = s.add_widget("taskSummary", WidgetOverrides::default()).unwrap().id;
        let b = s.add_widget("notifications", WidgetOverrides::default()).unwrap().id;
        s.set_layout_mode(LayoutMode::List);
        assert!(s.reorder_widget(&b, 0));
        assert_eq!(s.state().layout_entry(&b).unwrap().y, 0);
        assert_eq!(s.state().layout_entry(&a).unwrap().y, 3);
        assert!(!s.reorder_widget("ghost", 0));
    }

    #[test]
    fn mark_saved_ignores_stale_revision() {
        let mut s = store(Role::Member);
        s.add_widget("taskList", WidgetOverrides::default()).unwrap();
        let (rev, _) = s.snapshot();
        s.set_theme(Theme::Dark);
        assert!(!s.mark_saved(rev));
        assert!(s.is_dirty());
        assert!(s.mark_saved(s.revision()));
        assert!(!s.is_dirty());
    }

    #[test]
    fn replace_all_clears_dirty_and_flags_unbound() {
        let mut s = store(Role::Manager);
        s.add_widget("taskList", WidgetOverrides::default()).unwrap();
        let mut state = DashboardState::default();
        state.widgets.push(WidgetInstance {
            id: "p".into(),
            type_id: "projectSummary".into(),
            title: "P".into(),
            config: json!({}),
            position: Position::new(0, 0, 4, 3),
        });
        s.replace_all(state);
        assert!(!s.is_dirty());
        assert!(s.needs_configuration("p"));
        assert!(s.state().layout_matches_widgets());

        s.reset_to_template();
        assert!(s.is_dirty());
        assert!(!s.widgets().is_empty());
    }

    #[test]
    fn positions_past_the_last_row_are_rejected() {
        let mut s = store(Role::Member);
        let id = s.add_widget("taskList", WidgetOverrides::default()).unwrap().id;
        assert_eq!(
            s.set_layout_entry(&id, Position::new(0, u32::MAX - 1, 6, 4)),
            Err(StoreError::InvalidGeometry { y: u32::MAX - 1, w: 6, h: 4 })
        );
        assert!(s
            .set_layout_entry(&id, Position::new(0, MAX_ROWS - 4, 6, 4))
            .unwrap());
        let next = s.add_widget("notifications", WidgetOverrides::default()).unwrap();
        let placed = s.widget(&next.id).unwrap().position;
        assert!(placed.y + placed.h <= MAX_ROWS);
    }

    #[test]
    fn oversized_loaded_widgets_are_clamped_before_layout() {
        let mut s = store(Role::Member);
        let mut state = DashboardState {
            layout_mode: LayoutMode::List,
            ..DashboardState::default()
        };
        for id in ["a", "b"] {
            state.widgets.push(WidgetInstance {
                id: id.into(),
                type_id: "taskList".into(),
                title: id.into(),
                config: json!({}),
                position: Position::new(0, u32::MAX, 6, u32::MAX),
            });
        }
        s.replace_all_unsaved(state);
        assert!(s.widgets().iter().all(|w| w.position.is_placeable()));
        assert!(s.state().layout_matches_widgets());
    }

    #[test]
    fn blank_rename_is_ignored() {
        let mut s = store(Role::Member);
        let id = s.add_widget("taskList", WidgetOverrides::titled("Mine")).unwrap().id;
        let rev = s.revision();
        assert!(!s.rename_widget(&id, "   "));
        assert!(!s.rename_widget(&id, ""));
        assert_eq!(s.widget(&id).unwrap().title, "Mine");
        assert_eq!(s.revision(), rev);
        assert!(s.rename_widget(&id, "Team"));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_mutation_emits_a_debug_event() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut s = store(Role::Member);
            let a = s.add_widget("taskList", WidgetOverrides::default()).unwrap().id;
            let b = s.add_widget("notifications", WidgetOverrides::default()).unwrap().id;
            s.rename_widget(&a, "Renamed");
            s.set_layout_entry(&a, Position::new(0, 8, 6, 4)).unwrap();
            s.apply_grid_layout(&[LayoutEntry::new(b.clone(), Position::new(6, 0, 6, 3))])
                .unwrap();
            s.reorder_widget(&b, 0);
            s.set_theme(Theme::Dark);
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        for message in [
            "widget added",
            "widget renamed",
            "widget moved",
            "grid layout applied",
            "widget reordered",
            "theme changed",
        ] {
            assert!(out.contains(message), "missing '{message}' in {out}");
        }
        assert!(out.contains("instance_id"));
    }
}
