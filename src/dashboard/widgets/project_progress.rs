use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_range_days() -> u32 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgressConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default = "default_range_days")]
    pub range_days: u32,
}

impl Default for ProjectProgressConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            range_days: default_range_days(),
        }
    }
}

pub struct ProjectProgressWidget {
    cfg: ProjectProgressConfig,
}

impl ProjectProgressWidget {
    pub fn new(cfg: ProjectProgressConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for ProjectProgressWidget {
    fn queries(&self) -> Vec<DataQuery> {
        let Some(project_id) = non_empty(&self.cfg.project_id) else {
            return Vec::new();
        };
        vec![DataQuery::ProjectProgress {
            project_id,
            range_days: self.cfg.range_days.clamp(1, 365),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }

    fn is_bound(&self) -> bool {
        non_empty(&self.cfg.project_id).is_some()
    }
}
