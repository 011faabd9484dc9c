use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummaryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub assigned_to_me: bool,
}

pub struct TaskSummaryWidget {
    cfg: TaskSummaryConfig,
}

impl TaskSummaryWidget {
    pub fn new(cfg: TaskSummaryConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for TaskSummaryWidget {
    fn queries(&self) -> Vec<DataQuery> {
        vec![DataQuery::TaskCounts {
            project_id: non_empty(&self.cfg.project_id),
            assigned_to_me: self.cfg.assigned_to_me,
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
