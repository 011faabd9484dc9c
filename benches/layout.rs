use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dashboard_engine::dashboard::layout::compute_layout;
use dashboard_engine::dashboard::model::{LayoutMode, Position, WidgetInstance};
use dashboard_engine::dashboard::WidgetRegistry;
use serde_json::json;

fn widgets(count: usize) -> Vec<WidgetInstance> {
    let types = ["taskList", "taskSummary", "notifications", "analyticsChart"];
    (0..count)
        .map(|i| WidgetInstance {
            id: format!("w-{i}"),
            type_id: types[i % types.len()].to_string(),
            title: format!("Widget {i}"),
            config: json!({}),
            position: Position::new((i as u32 % 3) * 4, (i as u32 / 3) * 3, 4, 3),
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let registry = WidgetRegistry::with_defaults();
    let widgets = widgets(200);
    for mode in [LayoutMode::Grid, LayoutMode::List, LayoutMode::Compact] {
        c.bench_function(&format!("layout_{}", mode.as_str()), |b| {
            b.iter(|| compute_layout(black_box(mode), black_box(&widgets), &registry))
        });
    }
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
