use crate::dashboard::model::{DashboardState, LayoutEntry, Position};
use crate::dashboard::widgets::{DataQuery, EntityKind, Widget, WidgetRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What the presentation layer should draw inside one layout cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Ready { queries: Vec<DataQuery> },
    /// The widget needs a project or team picked before it can fetch data.
    NeedsConfiguration { kind: EntityKind },
    /// Placeholder for a type the registry no longer knows.
    Unknown { type_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetFrame {
    pub instance_id: String,
    pub title: String,
    pub entry: LayoutEntry,
    pub body: FrameBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    id: String,
    type_id: String,
}

struct SlotRuntime {
    config: Value,
    widget: Box<dyn Widget>,
}

/// Live widget objects for the current dashboard, rebuilt incrementally so
/// widgets survive edits that do not touch them.
pub struct DashboardRuntime {
    registry: Arc<WidgetRegistry>,
    slots: HashMap<SlotKey, SlotRuntime>,
}

impl DashboardRuntime {
    pub fn new(registry: Arc<WidgetRegistry>) -> Self {
        Self {
            registry,
            slots: HashMap::new(),
        }
    }

    pub fn live_widgets(&self) -> usize {
        self.slots.len()
    }

    /// Reconcile live widgets with `state`: reuse by id and type, push
    /// changed config into kept widgets, drop the rest.
    pub fn sync(&mut self, state: &DashboardState) {
        let mut reusable = std::mem::take(&mut self.slots);
        for instance in &state.widgets {
            let key = SlotKey {
                id: instance.id.clone(),
                type_id: instance.type_id.clone(),
            };
            if let Some(mut runtime) = reusable.remove(&key) {
                if runtime.config != instance.config {
                    runtime.widget.on_config_updated(&instance.config);
                    runtime.config = instance.config.clone();
                }
                self.slots.insert(key, runtime);
            } else if let Some(widget) = self.registry.create(&instance.type_id, &instance.config) {
                self.slots.insert(
                    key,
                    SlotRuntime {
                        config: instance.config.clone(),
                        widget,
                    },
                );
            }
        }
        if !reusable.is_empty() {
            tracing::debug!(dropped = reusable.len(), "dashboard widgets released");
        }
    }

    /// One frame per widget in widget order, positioned by the current layout.
    pub fn frames(&self, state: &DashboardState) -> Vec<WidgetFrame> {
        state
            .widgets
            .iter()
            .map(|instance| {
                let entry = state
                    .layout_entry(&instance.id)
                    .cloned()
                    .unwrap_or_else(|| LayoutEntry::new(instance.id.clone(), instance.position));
                let key = SlotKey {
                    id: instance.id.clone(),
                    type_id: instance.type_id.clone(),
                };
                let body = match (self.slots.get(&key), self.registry.descriptor(&instance.type_id)) {
                    (Some(runtime), Some(descriptor)) if !runtime.widget.is_bound() => {
                        match descriptor.binding() {
                            Some(binding) => FrameBody::NeedsConfiguration { kind: binding.kind },
                            None => FrameBody::Ready {
                                queries: runtime.widget.queries(),
                            },
                        }
                    }
                    (Some(runtime), Some(_)) => FrameBody::Ready {
                        queries: runtime.widget.queries(),
                    },
                    _ => FrameBody::Unknown {
                        type_id: instance.type_id.clone(),
                    },
                };
                WidgetFrame {
                    instance_id: instance.id.clone(),
                    title: instance.title.clone(),
                    entry,
                    body,
                }
            })
            .collect()
    }

    pub fn frame_at(&self, state: &DashboardState, position: Position) -> Option<WidgetFrame> {
        self.frames(state).into_iter().find(|f| {
            let e = &f.entry;
            position.x >= e.x && position.x < e.x + e.w && position.y >= e.y && position.y < e.y + e.h
        })
    }
}
