use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatusFilter {
    #[default]
    Open,
    InProgress,
    Done,
    All,
}

impl TaskStatusFilter {
    fn as_query(&self) -> Option<String> {
        match self {
            TaskStatusFilter::Open => Some("open".into()),
            TaskStatusFilter::InProgress => Some("in_progress".into()),
            TaskStatusFilter::Done => Some("done".into()),
            TaskStatusFilter::All => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskListConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: TaskStatusFilter,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_assigned_to_me")]
    pub assigned_to_me: bool,
}

fn default_assigned_to_me() -> bool {
    true
}

impl Default for TaskListConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            status: TaskStatusFilter::default(),
            limit: default_limit(),
            assigned_to_me: default_assigned_to_me(),
        }
    }
}

pub struct TaskListWidget {
    cfg: TaskListConfig,
}

impl TaskListWidget {
    pub fn new(cfg: TaskListConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for TaskListWidget {
    fn queries(&self) -> Vec<DataQuery> {
        vec![DataQuery::Tasks {
            project_id: non_empty(&self.cfg.project_id),
            status: self.cfg.status.as_query(),
            assigned_to_me: self.cfg.assigned_to_me,
            limit: self.cfg.limit.clamp(1, 100),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
