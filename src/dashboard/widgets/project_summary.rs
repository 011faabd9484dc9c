use super::{non_empty, typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

pub struct ProjectSummaryWidget {
    cfg: ProjectSummaryConfig,
}

impl ProjectSummaryWidget {
    pub fn new(cfg: ProjectSummaryConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for ProjectSummaryWidget {
    fn queries(&self) -> Vec<DataQuery> {
        match non_empty(&self.cfg.project_id) {
            Some(project_id) => vec![DataQuery::ProjectSummary { project_id }],
            None => Vec::new(),
        }
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }

    fn is_bound(&self) -> bool {
        non_empty(&self.cfg.project_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config_has_no_project_key() {
        let value = serde_json::to_value(ProjectSummaryConfig::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn unbound_widget_issues_no_queries() {
        let mut widget = ProjectSummaryWidget::new(ProjectSummaryConfig::default());
        assert!(!widget.is_bound());
        assert!(widget.queries().is_empty());

        widget.on_config_updated(&json!({"projectId": "p-7"}));
        assert!(widget.is_bound());
        assert_eq!(
            widget.queries(),
            vec![DataQuery::ProjectSummary {
                project_id: "p-7".into()
            }]
        );
    }
}
