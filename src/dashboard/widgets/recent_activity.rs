use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RecentActivityConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            limit: default_limit(),
        }
    }
}

pub struct RecentActivityWidget {
    cfg: RecentActivityConfig,
}

impl RecentActivityWidget {
    pub fn new(cfg: RecentActivityConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for RecentActivityWidget {
    fn queries(&self) -> Vec<DataQuery> {
        vec![DataQuery::Activity {
            project_id: non_empty(&self.cfg.project_id),
            limit: self.cfg.limit.clamp(1, 50),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
