use crate::dashboard::model::{new_instance_id, Footprint, Position, Role, WidgetInstance};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

mod analytics_chart;
mod notifications;
mod project_progress;
mod project_summary;
mod recent_activity;
mod task_list;
mod task_summary;
mod team_workload;
mod upcoming_deadlines;

pub use analytics_chart::{AnalyticsChartConfig, AnalyticsChartWidget, ChartKind};
pub use notifications::{NotificationsConfig, NotificationsWidget};
pub use project_progress::{ProjectProgressConfig, ProjectProgressWidget};
pub use project_summary::{ProjectSummaryConfig, ProjectSummaryWidget};
pub use recent_activity::{RecentActivityConfig, RecentActivityWidget};
pub use task_list::{TaskListConfig, TaskListWidget, TaskStatusFilter};
pub use task_summary::{TaskSummaryConfig, TaskSummaryWidget};
pub use team_workload::{TeamWorkloadConfig, TeamWorkloadWidget};
pub use upcoming_deadlines::{UpcomingDeadlinesConfig, UpcomingDeadlinesWidget};

const DEFAULT_FOOTPRINT: Footprint = Footprint::new(4, 3);

/// Kind of external entity a widget can be bound to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Team,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Team => "team",
        }
    }
}

/// Required external reference and the config key that stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub kind: EntityKind,
    pub key: &'static str,
}

/// Request a widget issues against the external fetch/query layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "query", rename_all = "camelCase")]
pub enum DataQuery {
    #[serde(rename_all = "camelCase")]
    TaskCounts {
        project_id: Option<String>,
        assigned_to_me: bool,
    },
    #[serde(rename_all = "camelCase")]
    Tasks {
        project_id: Option<String>,
        status: Option<String>,
        assigned_to_me: bool,
        limit: usize,
    },
    #[serde(rename_all = "camelCase")]
    ProjectSummary { project_id: String },
    #[serde(rename_all = "camelCase")]
    ProjectProgress { project_id: String, range_days: u32 },
    #[serde(rename_all = "camelCase")]
    TeamWorkload { team_id: String, include_unassigned: bool },
    #[serde(rename_all = "camelCase")]
    Activity {
        project_id: Option<String>,
        limit: usize,
    },
    #[serde(rename_all = "camelCase")]
    Notifications { unread_only: bool, limit: usize },
    #[serde(rename_all = "camelCase")]
    Analytics {
        metric: String,
        chart: ChartKind,
        range_days: u32,
    },
    #[serde(rename_all = "camelCase")]
    Deadlines { within_days: u32, limit: usize },
}

/// Widget trait implemented by all dashboard widget types.
///
/// Chart drawing lives in the presentation layer; a widget only declares
/// which data it needs and whether it is ready to fetch it.
pub trait Widget: Send {
    fn queries(&self) -> Vec<DataQuery>;

    fn on_config_updated(&mut self, _settings: &Value) {}

    /// False while a required binding (e.g. a project id) is missing.
    fn is_bound(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetMetadata {
    pub type_id: String,
    pub name: String,
    pub footprint: Footprint,
    pub requires_binding: bool,
}

/// Static description of one widget type.
#[derive(Clone)]
pub struct WidgetDescriptor {
    type_id: String,
    name: String,
    ctor: Arc<dyn Fn(&Value) -> Box<dyn Widget> + Send + Sync>,
    default_settings: Arc<dyn Fn() -> Value + Send + Sync>,
    footprint: Footprint,
    allowed_roles: HashSet<Role>,
    binding: Option<Binding>,
}

pub type WidgetFactory = WidgetDescriptor;

impl WidgetDescriptor {
    pub fn new<T: Widget + 'static, C: DeserializeOwned + Serialize + Default + 'static>(
        build: fn(C) -> T,
    ) -> Self {
        Self {
            type_id: String::new(),
            name: String::new(),
            ctor: Arc::new(move |v| {
                let cfg = serde_json::from_value::<C>(v.clone()).unwrap_or_default();
                Box::new(build(cfg))
            }),
            default_settings: Arc::new(|| {
                serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}))
            }),
            footprint: DEFAULT_FOOTPRINT,
            allowed_roles: Role::ALL.into_iter().collect(),
            binding: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_footprint(mut self, w: u32, h: u32) -> Self {
        self.footprint = Footprint::new(w.max(1), h.max(1));
        self
    }

    pub fn with_roles(mut self, roles: &[Role]) -> Self {
        self.allowed_roles = roles.iter().copied().collect();
        self
    }

    pub fn with_binding(mut self, kind: EntityKind, key: &'static str) -> Self {
        self.binding = Some(Binding { kind, key });
        self
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.type_id
        } else {
            &self.name
        }
    }

    /// A fresh copy of the type's default configuration.
    pub fn default_config(&self) -> Value {
        (self.default_settings)()
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }

    pub fn requires_binding(&self) -> bool {
        self.binding.is_some()
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    /// Whether `config` carries a non-empty value for the binding key.
    pub fn is_bound(&self, config: &Value) -> bool {
        match self.binding {
            Some(binding) => config
                .get(binding.key)
                .and_then(Value::as_str)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn create(&self, settings: &Value) -> Box<dyn Widget> {
        (self.ctor)(settings)
    }

    pub fn metadata(&self) -> WidgetMetadata {
        WidgetMetadata {
            type_id: self.type_id.clone(),
            name: self.name().to_string(),
            footprint: self.footprint,
            requires_binding: self.requires_binding(),
        }
    }
}

/// Outcome of a registry lookup. Unknown types are a degraded-render case.
#[derive(Clone, Copy)]
pub enum Resolution<'a> {
    Found(&'a WidgetDescriptor),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn descriptor(self) -> Option<&'a WidgetDescriptor> {
        match self {
            Resolution::Found(d) => Some(d),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    map: HashMap<String, WidgetDescriptor>,
}

impl WidgetRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        reg.register(
            "taskSummary",
            WidgetFactory::new(TaskSummaryWidget::new)
                .with_name("Task Summary")
                .with_footprint(4, 2),
        );
        reg.register(
            "taskList",
            WidgetFactory::new(TaskListWidget::new)
                .with_name("Task List")
                .with_footprint(6, 4),
        );
        reg.register(
            "projectSummary",
            WidgetFactory::new(ProjectSummaryWidget::new)
                .with_name("Project Summary")
                .with_footprint(4, 3)
                .with_binding(EntityKind::Project, "projectId"),
        );
        reg.register(
            "projectProgress",
            WidgetFactory::new(ProjectProgressWidget::new)
                .with_name("Project Progress")
                .with_footprint(6, 3)
                .with_binding(EntityKind::Project, "projectId"),
        );
        reg.register(
            "teamWorkload",
            WidgetFactory::new(TeamWorkloadWidget::new)
                .with_name("Team Workload")
                .with_footprint(6, 4)
                .with_roles(&[Role::Admin, Role::Manager])
                .with_binding(EntityKind::Team, "teamId"),
        );
        reg.register(
            "recentActivity",
            WidgetFactory::new(RecentActivityWidget::new)
                .with_name("Recent Activity")
                .with_footprint(4, 4),
        );
        reg.register(
            "notifications",
            WidgetFactory::new(NotificationsWidget::new)
                .with_name("Notifications")
                .with_footprint(4, 3),
        );
        reg.register(
            "analyticsChart",
            WidgetFactory::new(AnalyticsChartWidget::new)
                .with_name("Analytics")
                .with_footprint(6, 4)
                .with_roles(&[Role::Admin, Role::Manager]),
        );
        reg.register(
            "upcomingDeadlines",
            WidgetFactory::new(UpcomingDeadlinesWidget::new)
                .with_name("Upcoming Deadlines")
                .with_footprint(4, 3),
        );
        reg
    }

    pub fn register(&mut self, type_id: &str, mut factory: WidgetFactory) {
        factory.type_id = type_id.to_string();
        self.map.insert(type_id.to_string(), factory);
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.map.contains_key(type_id)
    }

    pub fn resolve(&self, type_id: &str) -> Resolution<'_> {
        match self.map.get(type_id) {
            Some(d) => Resolution::Found(d),
            None => Resolution::NotFound,
        }
    }

    pub fn descriptor(&self, type_id: &str) -> Option<&WidgetDescriptor> {
        self.map.get(type_id)
    }

    /// Widget types the given role may place, sorted by type id.
    pub fn list_available(&self, role: Role) -> Vec<&WidgetDescriptor> {
        let mut out: Vec<&WidgetDescriptor> =
            self.map.values().filter(|d| d.allows(role)).collect();
        out.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        out
    }

    /// Build a new instance of `type_id` with a fresh id, a private copy of
    /// the default config and the default footprint at the origin.
    pub fn default_instance_for(&self, type_id: &str) -> Option<WidgetInstance> {
        let descriptor = self.map.get(type_id)?;
        Some(WidgetInstance {
            id: new_instance_id(),
            type_id: type_id.to_string(),
            title: descriptor.name().to_string(),
            config: descriptor.default_config(),
            position: Position::at_origin(descriptor.footprint),
        })
    }

    pub fn create(&self, type_id: &str, settings: &Value) -> Option<Box<dyn Widget>> {
        let settings = if settings.is_null() {
            self.default_config(type_id)
                .unwrap_or_else(|| Value::Object(Default::default()))
        } else {
            settings.clone()
        };
        self.map.get(type_id).map(|f| f.create(&settings))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn metadata(&self) -> Vec<WidgetMetadata> {
        let mut meta: Vec<WidgetMetadata> = self.map.values().map(|d| d.metadata()).collect();
        meta.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        meta
    }

    pub fn default_config(&self, type_id: &str) -> Option<Value> {
        self.map.get(type_id).map(|f| f.default_config())
    }

    pub fn default_footprint(&self, type_id: &str) -> Option<Footprint> {
        self.map.get(type_id).map(|f| f.footprint)
    }
}

/// Shallow merge of `updates` over `base`; unknown keys in `base` survive.
pub(crate) fn merge_json(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

pub(crate) fn typed_config<C: DeserializeOwned + Default>(settings: &Value) -> C {
    serde_json::from_value::<C>(settings.clone()).unwrap_or_default()
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_json_preserves_unknown_fields() {
        let base = json!({"known": 1, "extra": {"keep": true}});
        let updates = json!({"known": 2});
        let merged = merge_json(&base, &updates);
        assert_eq!(merged["known"], json!(2));
        assert_eq!(merged["extra"], json!({"keep": true}));
    }

    #[test]
    fn resolve_unknown_type_is_sentinel() {
        let reg = WidgetRegistry::with_defaults();
        assert!(!reg.resolve("burndown3d").is_found());
        assert!(reg.resolve("taskList").is_found());
    }

    #[test]
    fn list_available_filters_by_role() {
        let reg = WidgetRegistry::with_defaults();
        let member: Vec<&str> = reg
            .list_available(Role::Member)
            .into_iter()
            .map(|d| d.type_id())
            .collect();
        assert!(!member.contains(&"analyticsChart"));
        assert!(!member.contains(&"teamWorkload"));
        assert!(member.contains(&"taskList"));

        let admin = reg.list_available(Role::Admin);
        assert_eq!(admin.len(), reg.names().len());
    }

    #[test]
    fn default_instance_copies_config_and_footprint() {
        let reg = WidgetRegistry::with_defaults();
        let a = reg.default_instance_for("taskList").unwrap();
        let mut b = reg.default_instance_for("taskList").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.position, Position::new(0, 0, 6, 4));

        b.config["limit"] = json!(99);
        let c = reg.default_instance_for("taskList").unwrap();
        assert_ne!(c.config["limit"], json!(99));
        assert_eq!(c.config, a.config);
    }

    #[test]
    fn binding_detection_uses_config_key() {
        let reg = WidgetRegistry::with_defaults();
        let d = reg.descriptor("projectSummary").unwrap();
        assert!(d.requires_binding());
        assert!(!d.is_bound(&json!({})));
        assert!(!d.is_bound(&json!({"projectId": "  "})));
        assert!(d.is_bound(&json!({"projectId": "p-1"})));
        assert!(reg.descriptor("taskList").unwrap().is_bound(&json!({})));
    }

    #[test]
    fn create_with_null_settings_uses_defaults() {
        let reg = WidgetRegistry::with_defaults();
        let widget = reg.create("notifications", &Value::Null).unwrap();
        assert_eq!(
            widget.queries(),
            vec![DataQuery::Notifications {
                unread_only: true,
                limit: 10
            }]
        );
    }
}
