use super::{typed_config, DataQuery, Widget};
use serde::{Deserialize, Serialize};

fn default_metric() -> String {
    "tasksCompleted".into()
}

fn default_range_days() -> u32 {
    14
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsChartConfig {
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default)]
    pub chart: ChartKind,
    #[serde(default = "default_range_days")]
    pub range_days: u32,
}

impl Default for AnalyticsChartConfig {
    fn default() -> Self {
        Self {
            metric: default_metric(),
            chart: ChartKind::default(),
            range_days: default_range_days(),
        }
    }
}

pub struct AnalyticsChartWidget {
    cfg: AnalyticsChartConfig,
}

impl AnalyticsChartWidget {
    pub fn new(cfg: AnalyticsChartConfig) -> Self {
        Self { cfg }
    }
}

impl Widget for AnalyticsChartWidget {
    fn queries(&self) -> Vec<DataQuery> {
        let metric = if self.cfg.metric.trim().is_empty() {
            default_metric()
        } else {
            self.cfg.metric.trim().to_string()
        };
        vec![DataQuery::Analytics {
            metric,
            chart: self.cfg.chart,
            range_days: self.cfg.range_days.clamp(1, 365),
        }]
    }

    fn on_config_updated(&mut self, settings: &serde_json::Value) {
        self.cfg = typed_config(settings);
    }
}
