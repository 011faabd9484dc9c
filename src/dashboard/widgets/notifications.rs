use super::{typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_limit() -> usize {
    10
}

fn default_unread_only() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsConfig {
    #[serde(default = "default_unread_only")]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            unread_only: default_unread_only(),
            limit: default_limit(),
        }
    }
}

pub struct NotificationsWidget {
    cfg: NotificationsConfig,
}

impl NotificationsWidget {
    pub fn new(cfg: NotificationsConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for NotificationsWidget {
    fn queries(&self) -> Vec<DataQuery> {
        vec![DataQuery::Notifications {
            unread_only: self.cfg.unread_only,
            limit: self.cfg.limit.max(1),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
