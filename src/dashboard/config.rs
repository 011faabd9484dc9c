use crate::dashboard::layout::{clamp_position, compute_layout};
use crate::dashboard::model::{
    new_instance_id, DashboardState, Position, Role, WidgetInstance, GRID_COLUMNS,
};
use crate::dashboard::widgets::{merge_json, WidgetRegistry};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Widget type ids that were renamed, mapped to their replacement.
const LEGACY_TYPES: &[(&str, &str)] = &[
    ("tasks", "taskList"),
    ("myTasks", "taskList"),
    ("projectStats", "projectSummary"),
    ("activity", "recentActivity"),
    ("activityFeed", "recentActivity"),
];

/// Widgets placed on a fresh dashboard, per role.
fn template_types(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &[
            "taskSummary",
            "analyticsChart",
            "teamWorkload",
            "projectProgress",
            "recentActivity",
            "notifications",
        ],
        Role::Manager => &[
            "taskSummary",
            "projectSummary",
            "teamWorkload",
            "taskList",
            "analyticsChart",
            "upcomingDeadlines",
        ],
        Role::Member => &[
            "taskSummary",
            "taskList",
            "upcomingDeadlines",
            "notifications",
            "recentActivity",
        ],
    }
}

/// Build the default dashboard for `role`, packing widgets row by row.
pub fn default_template(role: Role, registry: &WidgetRegistry) -> DashboardState {
    let mut widgets = Vec::new();
    let (mut x, mut y, mut row_h) = (0u32, 0u32, 0u32);
    for type_id in template_types(role) {
        let Some(descriptor) = registry.descriptor(type_id) else {
            continue;
        };
        if !descriptor.allows(role) {
            continue;
        }
        let Some(mut instance) = registry.default_instance_for(type_id) else {
            continue;
        };
        let fp = descriptor.footprint();
        if x + fp.w > GRID_COLUMNS {
            x = 0;
            y += row_h;
            row_h = 0;
        }
        instance.position = Position::new(x, y, fp.w.min(GRID_COLUMNS), fp.h);
        x += fp.w;
        row_h = row_h.max(fp.h);
        widgets.push(instance);
    }

    let mut state = DashboardState {
        name: format!("{} dashboard", capitalize(role.as_str())),
        widgets,
        ..DashboardState::default()
    };
    state.layout = compute_layout(state.layout_mode, &state.widgets, registry);
    state
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Repair a state loaded from outside the session and return human readable
/// warnings. Unknown widget types are kept so they render as placeholders.
pub fn sanitize(state: &mut DashboardState, registry: &WidgetRegistry) -> Vec<String> {
    let mut warnings = Vec::new();
    migrate_legacy_types(&mut state.widgets, registry, &mut warnings);

    let mut seen = HashSet::new();
    for widget in &mut state.widgets {
        if widget.id.trim().is_empty() || !seen.insert(widget.id.clone()) {
            let old = std::mem::replace(&mut widget.id, new_instance_id());
            seen.insert(widget.id.clone());
            tracing::warn!(old_id = %old, new_id = %widget.id, "widget id reassigned");
            warnings.push(format!(
                "widget '{}' had a missing or duplicate id and was reassigned",
                widget.type_id
            ));
        }
        sanitize_widget(widget, registry, &mut warnings);
    }

    state.layout = compute_layout(state.layout_mode, &state.widgets, registry);
    warnings
}

fn sanitize_widget(widget: &mut WidgetInstance, registry: &WidgetRegistry, warnings: &mut Vec<String>) {
    let descriptor = registry.descriptor(&widget.type_id);
    if descriptor.is_none() {
        tracing::warn!(widget = %widget.type_id, id = %widget.id, "unknown dashboard widget kept as placeholder");
        warnings.push(format!("unknown dashboard widget '{}'", widget.type_id));
    }

    if !widget.config.is_object() {
        widget.config = descriptor
            .map(|d| d.default_config())
            .unwrap_or_else(|| json!({}));
    }

    if widget.title.trim().is_empty() {
        widget.title = descriptor
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| widget.type_id.clone());
    }

    if !widget.position.is_sized() {
        let fp = registry.default_footprint(&widget.type_id);
        if widget.position.w == 0 {
            widget.position.w = fp.map(|f| f.w).unwrap_or(1);
        }
        if widget.position.h == 0 {
            widget.position.h = fp.map(|f| f.h).unwrap_or(1);
        }
        warnings.push(format!("widget '{}' had an empty footprint", widget.id));
    }
    widget.position = clamp_position(widget.position, GRID_COLUMNS);
}

fn migrate_legacy_types(
    widgets: &mut [WidgetInstance],
    registry: &WidgetRegistry,
    warnings: &mut Vec<String>,
) {
    for widget in widgets {
        let Some((_, target)) = LEGACY_TYPES
            .iter()
            .find(|(legacy, _)| *legacy == widget.type_id)
        else {
            continue;
        };
        let Some(defaults) = registry.default_config(target) else {
            continue;
        };
        let legacy_name = std::mem::replace(&mut widget.type_id, target.to_string());
        let settings = if widget.config.is_object() {
            widget.config.clone()
        } else {
            Value::Object(Default::default())
        };
        widget.config = merge_json(&defaults, &settings);
        warnings.push(format!(
            "dashboard widget '{}' migrated to '{}'",
            legacy_name, target
        ));
    }
}
