use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamWorkloadConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub include_unassigned: bool,
}

pub struct TeamWorkloadWidget {
    cfg: TeamWorkloadConfig,
}

impl TeamWorkloadWidget {
    pub fn new(cfg: TeamWorkloadConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for TeamWorkloadWidget {
    fn queries(&self) -> Vec<DataQuery> {
        match non_empty(&self.cfg.team_id) {
            Some(team_id) => vec![DataQuery::TeamWorkload {
                team_id,
                include_unassigned: self.cfg.include_unassigned,
            }],
            None => Vec::new(),
        }
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }

    fn is_bound(&self) -> bool {
        non_empty(&self.cfg.team_id).is_some()
    }
}
