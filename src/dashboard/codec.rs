use crate::dashboard::model::{
    DashboardState, LayoutEntry, LayoutMode, Position, Theme, WidgetInstance,
};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Portable dashboard document produced by export and consumed by import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    pub name: String,
    pub layout_mode: LayoutMode,
    pub theme: Theme,
    pub widgets: Vec<WidgetInstance>,
    pub layout: Vec<LayoutEntry>,
    pub exported_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Malformed(String),
    NotAnObject,
    MissingWidgets,
    WidgetsNotList,
    WidgetNotObject { index: usize },
    WidgetMissingField { index: usize, field: &'static str },
    InvalidField { index: usize, field: &'static str },
    DuplicateWidgetId(String),
    LayoutNotList,
    InvalidLayoutEntry { index: usize },
    DuplicateLayoutEntry(String),
    DanglingLayoutEntry { instance_id: String },
    InvalidGeometry { id: String },
    InvalidDocumentField(&'static str),
    UnknownLayoutMode(String),
    UnknownTheme(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Malformed(err) => write!(f, "document is not valid JSON: {err}"),
            ImportError::NotAnObject => write!(f, "document must be a JSON object"),
            ImportError::MissingWidgets => write!(f, "document has no 'widgets' field"),
            ImportError::WidgetsNotList => write!(f, "'widgets' must be a list"),
            ImportError::WidgetNotObject { index } => {
                write!(f, "widget #{index} must be an object")
            }
            ImportError::WidgetMissingField { index, field } => {
                write!(f, "widget #{index} is missing '{field}'")
            }
            ImportError::InvalidField { index, field } => {
                write!(f, "widget #{index} has an invalid '{field}'")
            }
            ImportError::DuplicateWidgetId(id) => write!(f, "widget id '{id}' appears twice"),
            ImportError::LayoutNotList => write!(f, "'layout' must be a list"),
            ImportError::InvalidLayoutEntry { index } => {
                write!(f, "layout entry #{index} is invalid")
            }
            ImportError::DuplicateLayoutEntry(id) => {
                write!(f, "layout lists widget '{id}' more than once")
            }
            ImportError::DanglingLayoutEntry { instance_id } => {
                write!(f, "layout references unknown widget '{instance_id}'")
            }
            ImportError::InvalidGeometry { id } => {
                write!(f, "widget '{id}' has a zero size or lies outside the grid rows")
            }
            ImportError::InvalidDocumentField(field) => {
                write!(f, "document field '{field}' must be a string")
            }
            ImportError::UnknownLayoutMode(mode) => write!(f, "unknown layout mode '{mode}'"),
            ImportError::UnknownTheme(theme) => write!(f, "unknown theme '{theme}'"),
        }
    }
}

impl std::error::Error for ImportError {}

pub fn export(state: &DashboardState, now: DateTime<Utc>) -> DashboardDocument {
    DashboardDocument {
        name: state.name.clone(),
        layout_mode: state.layout_mode,
        theme: state.theme,
        widgets: state.widgets.clone(),
        layout: state.layout.clone(),
        exported_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Pretty JSON with struct fields in declaration order and map keys sorted.
pub fn to_json(document: &DashboardDocument) -> Result<String> {
    serde_json::to_string_pretty(document).context("serialize dashboard document")
}

pub fn export_to_path(state: &DashboardState, path: &Path) -> Result<()> {
    let json = to_json(&export(state, Utc::now()))?;
    std::fs::write(path, json).with_context(|| format!("write dashboard export {}", path.display()))
}

pub fn import_from_path(path: &Path) -> Result<DashboardState> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read dashboard import {}", path.display()))?;
    import_str(&text).with_context(|| format!("import dashboard {}", path.display()))
}

pub fn import_str(text: &str) -> Result<DashboardState, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;
    import_value(&value)
}

/// Validate a document and build the state it describes.
///
/// The result is marked dirty; nothing is applied or persisted here. A
/// widget without a position takes its layout entry's rectangle; one with
/// neither is left unsized for the store to fill from the default footprint.
pub fn import_value(value: &Value) -> Result<DashboardState, ImportError> {
    let doc = value.as_object().ok_or(ImportError::NotAnObject)?;
    let raw_widgets = doc
        .get("widgets")
        .ok_or(ImportError::MissingWidgets)?
        .as_array()
        .ok_or(ImportError::WidgetsNotList)?;

    let mut widgets = Vec::with_capacity(raw_widgets.len());
    let mut ids = HashSet::new();
    let mut explicit_positions = HashSet::new();
    for (index, raw) in raw_widgets.iter().enumerate() {
        let (widget, has_position) = parse_widget(index, raw)?;
        if !ids.insert(widget.id.clone()) {
            return Err(ImportError::DuplicateWidgetId(widget.id));
        }
        if has_position {
            explicit_positions.insert(widget.id.clone());
        }
        widgets.push(widget);
    }

    let layout = match doc.get("layout") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => parse_layout(entries, &ids)?,
        Some(_) => return Err(ImportError::LayoutNotList),
    };

    let name = optional_string(doc, "name")?;
    let layout_mode = match optional_string(doc, "layoutMode")? {
        None => LayoutMode::default(),
        Some(s) => LayoutMode::parse(s).ok_or_else(|| ImportError::UnknownLayoutMode(s.into()))?,
    };
    let theme = match optional_string(doc, "theme")? {
        None => Theme::default(),
        Some(s) => Theme::parse(s).ok_or_else(|| ImportError::UnknownTheme(s.into()))?,
    };

    let by_id: HashMap<&str, &LayoutEntry> =
        layout.iter().map(|e| (e.instance_id.as_str(), e)).collect();
    for widget in &mut widgets {
        if explicit_positions.contains(&widget.id) {
            continue;
        }
        if let Some(entry) = by_id.get(widget.id.as_str()) {
            widget.position = entry.position();
        }
    }
    let layout = widgets
        .iter()
        .map(|w| {
            by_id
                .get(w.id.as_str())
                .map(|e| (*e).clone())
                .unwrap_or_else(|| LayoutEntry::new(w.id.clone(), w.position))
        })
        .collect();

    let mut state = DashboardState {
        widgets,
        layout,
        layout_mode,
        theme,
        dirty: true,
        ..DashboardState::default()
    };
    if let Some(name) = name {
        state.name = name.to_string();
    }
    Ok(state)
}

/// Absent or null is `None`; any other non-string value is rejected.
fn optional_string<'a>(
    doc: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ImportError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ImportError::InvalidDocumentField(field)),
    }
}

fn parse_widget(index: usize, raw: &Value) -> Result<(WidgetInstance, bool), ImportError> {
    let obj = raw.as_object().ok_or(ImportError::WidgetNotObject { index })?;
    let id = required_string(obj, index, "id")?;
    let type_id = required_string(obj, index, "typeId")?;
    let title = match obj.get("title") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ImportError::InvalidField { index, field: "title" }),
    };
    let config = match obj.get("config") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v @ Value::Object(_)) => v.clone(),
        Some(_) => return Err(ImportError::InvalidField { index, field: "config" }),
    };
    let position = match obj.get("position") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let p: Position = serde_json::from_value(v.clone())
                .map_err(|_| ImportError::InvalidField { index, field: "position" })?;
            if !p.is_placeable() {
                return Err(ImportError::InvalidGeometry { id });
            }
            Some(p)
        }
    };
    let widget = WidgetInstance {
        id,
        type_id,
        title,
        config,
        position: position.unwrap_or_default(),
    };
    Ok((widget, position.is_some()))
}

fn required_string(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ImportError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            Err(ImportError::WidgetMissingField { index, field })
        }
        Some(_) => Err(ImportError::InvalidField { index, field }),
    }
}

fn parse_layout(entries: &[Value], ids: &HashSet<String>) -> Result<Vec<LayoutEntry>, ImportError> {
    let mut seen = HashSet::new();
    let mut layout = Vec::with_capacity(entries.len());
    for (index, raw) in entries.iter().enumerate() {
        let entry: LayoutEntry = serde_json::from_value(raw.clone())
            .map_err(|_| ImportError::InvalidLayoutEntry { index })?;
        if !ids.contains(&entry.instance_id) {
            return Err(ImportError::DanglingLayoutEntry {
                instance_id: entry.instance_id,
            });
        }
        if !entry.position().is_placeable() {
            return Err(ImportError::InvalidGeometry {
                id: entry.instance_id,
            });
        }
        if !seen.insert(entry.instance_id.clone()) {
            return Err(ImportError::DuplicateLayoutEntry(entry.instance_id));
        }
        layout.push(entry);
    }
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::model::MAX_ROWS;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn export_uses_document_field_names() {
        let state = DashboardState::default();
        let value = serde_json::to_value(export(&state, fixed_time())).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["name", "layoutMode", "theme", "widgets", "layout", "exportedAt"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(value["exportedAt"], json!("2024-03-01T12:00:00Z"));
    }

    #[test]
    fn export_is_byte_stable() {
        let state = DashboardState {
            widgets: vec![WidgetInstance {
                id: "a".into(),
                type_id: "taskList".into(),
                title: "Tasks".into(),
                config: json!({"z": 1, "a": 2}),
                position: Position::new(0, 0, 6, 4),
            }],
            layout: vec![LayoutEntry::new("a", Position::new(0, 0, 6, 4))],
            ..DashboardState::default()
        };
        let first = to_json(&export(&state, fixed_time())).unwrap();
        let second = to_json(&export(&state.clone(), fixed_time())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn position_falls_back_to_layout_entry() {
        let doc = json!({
            "widgets": [{"id": "a", "typeId": "taskList"}],
            "layout": [{"instanceId": "a", "x": 2, "y": 3, "w": 4, "h": 5}]
        });
        let state = import_value(&doc).unwrap();
        assert_eq!(state.widgets[0].position, Position::new(2, 3, 4, 5));
        assert!(state.dirty);
        assert!(state.layout_matches_widgets());
    }

    #[test]
    fn rejects_specific_shapes() {
        assert!(matches!(import_str("{"), Err(ImportError::Malformed(_))));
        assert_eq!(import_value(&json!([])), Err(ImportError::NotAnObject));
        assert_eq!(import_value(&json!({})), Err(ImportError::MissingWidgets));
        assert_eq!(
            import_value(&json!({"widgets": {}})),
            Err(ImportError::WidgetsNotList)
        );
        assert_eq!(
            import_value(&json!({"widgets": [{"typeId": "taskList"}]})),
            Err(ImportError::WidgetMissingField { index: 0, field: "id" })
        );
        assert_eq!(
            import_value(&json!({"widgets": [{"id": "a"}]})),
            Err(ImportError::WidgetMissingField { index: 0, field: "typeId" })
        );
        assert_eq!(
            import_value(&json!({"widgets": [
                {"id": "a", "typeId": "x"},
                {"id": "a", "typeId": "y"}
            ]})),
            Err(ImportError::DuplicateWidgetId("a".into()))
        );
        assert_eq!(
            import_value(&json!({"widgets": [], "layoutMode": "masonry"})),
            Err(ImportError::UnknownLayoutMode("masonry".into()))
        );
        assert_eq!(
            import_value(&json!({"widgets": [], "layoutMode": 7})),
            Err(ImportError::InvalidDocumentField("layoutMode"))
        );
        assert_eq!(
            import_value(&json!({"widgets": [], "theme": ["dark"]})),
            Err(ImportError::InvalidDocumentField("theme"))
        );
        assert_eq!(
            import_value(&json!({"widgets": [], "name": {"text": "x"}})),
            Err(ImportError::InvalidDocumentField("name"))
        );
        assert!(import_value(&json!({"widgets": [], "theme": null})).is_ok());
        assert_eq!(
            import_value(&json!({"widgets": [
                {"id": "a", "typeId": "x", "position": {"x": 0, "y": 0, "w": 0, "h": 1}}
            ]})),
            Err(ImportError::InvalidGeometry { id: "a".into() })
        );
    }

    #[test]
    fn rows_past_the_grid_are_rejected() {
        assert_eq!(
            import_value(&json!({"layoutMode": "list", "widgets": [
                {"id": "a", "typeId": "taskList", "position": {"x": 0, "y": 0, "w": 6, "h": 4294967295u32}},
                {"id": "b", "typeId": "taskList", "position": {"x": 0, "y": 0, "w": 6, "h": 4294967295u32}}
            ]})),
            Err(ImportError::InvalidGeometry { id: "a".into() })
        );
        assert_eq!(
            import_value(&json!({
                "widgets": [{"id": "a", "typeId": "taskList"}],
                "layout": [{"instanceId": "a", "x": 0, "y": 4294967294u32, "w": 6, "h": 4}]
            })),
            Err(ImportError::InvalidGeometry { id: "a".into() })
        );
        let edge = json!({"widgets": [
            {"id": "a", "typeId": "taskList", "position": {"x": 0, "y": MAX_ROWS - 4, "w": 6, "h": 4}}
        ]});
        assert!(import_value(&edge).is_ok());
    }
}
