use super::{typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_within_days() -> u32 {
    7
}

fn default_limit() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDeadlinesConfig {
    #[serde(default = "default_within_days")]
    pub within_days: u32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for UpcomingDeadlinesConfig {
    fn default() -> Self {
        Self {
            within_days: default_within_days(),
            limit: default_limit(),
        }
    }
}

pub struct UpcomingDeadlinesWidget {
    cfg: UpcomingDeadlinesConfig,
}

impl UpcomingDeadlinesWidget {
    pub fn new(cfg: UpcomingDeadlinesConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for UpcomingDeadlinesWidget {
    fn queries(&self) -> Vec<DataQuery> {
        vec![DataQuery::Deadlines {
            within_days: self.cfg.within_days.max(1),
            limit: self.cfg.limit.max(1),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
