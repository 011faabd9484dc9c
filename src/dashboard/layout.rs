use crate::dashboard::model::{
    LayoutEntry, LayoutMode, Position, WidgetInstance, GRID_COLUMNS, MAX_ROWS,
};
use crate::dashboard::widgets::WidgetRegistry;

/// Responsive breakpoints and the number of grid columns each one exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    Lg,
    Md,
    Sm,
    Xs,
    Xxs,
}

impl Breakpoint {
    pub fn columns(&self) -> u32 {
        match self {
            Breakpoint::Lg => GRID_COLUMNS,
            Breakpoint::Md => 10,
            Breakpoint::Sm => 6,
            Breakpoint::Xs => 4,
            Breakpoint::Xxs => 2,
        }
    }

    /// Pick the breakpoint for a container width in pixels.
    pub fn for_width(width_px: u32) -> Self {
        match width_px {
            w if w >= 1200 => Breakpoint::Lg,
            w if w >= 996 => Breakpoint::Md,
            w if w >= 768 => Breakpoint::Sm,
            w if w >= 480 => Breakpoint::Xs,
            _ => Breakpoint::Xxs,
        }
    }
}

/// Compute the layout on the canonical 12-column grid.
pub fn compute_layout(
    mode: LayoutMode,
    widgets: &[WidgetInstance],
    registry: &WidgetRegistry,
) -> Vec<LayoutEntry> {
    compute_layout_for(mode, widgets, registry, GRID_COLUMNS)
}

/// Compute the layout for `columns` grid columns.
///
/// Placement in List and Compact mode is a strict function of the widget's
/// index, so widget order is the only tie-break.
pub fn compute_layout_for(
    mode: LayoutMode,
    widgets: &[WidgetInstance],
    registry: &WidgetRegistry,
    columns: u32,
) -> Vec<LayoutEntry> {
    let columns = columns.max(1);
    match mode {
        LayoutMode::Grid => grid_layout(widgets, columns),
        LayoutMode::List => list_layout(widgets, registry, columns),
        LayoutMode::Compact if columns < 2 => list_layout(widgets, registry, columns),
        LayoutMode::Compact => compact_layout(widgets, registry, columns),
    }
}

fn grid_layout(widgets: &[WidgetInstance], columns: u32) -> Vec<LayoutEntry> {
    widgets
        .iter()
        .map(|w| LayoutEntry::new(w.id.clone(), clamp_position(w.position, columns)))
        .collect()
}

fn list_layout(
    widgets: &[WidgetInstance],
    registry: &WidgetRegistry,
    columns: u32,
) -> Vec<LayoutEntry> {
    let mut y = 0;
    widgets
        .iter()
        .map(|w| {
            let h = widget_height(w, registry);
            let entry = LayoutEntry::new(w.id.clone(), Position::new(0, y, columns, h));
            y = y.saturating_add(h);
            entry
        })
        .collect()
}

fn compact_layout(
    widgets: &[WidgetInstance],
    registry: &WidgetRegistry,
    columns: u32,
) -> Vec<LayoutEntry> {
    let half = columns / 2;
    let mut left_y: u32 = 0;
    let mut right_y: u32 = 0;
    widgets
        .iter()
        .enumerate()
        .map(|(idx, w)| {
            let h = widget_height(w, registry);
            let (x, y) = if idx % 2 == 0 {
                let y = left_y;
                left_y = left_y.saturating_add(h);
                (0, y)
            } else {
                let y = right_y;
                right_y = right_y.saturating_add(h);
                (half, y)
            };
            LayoutEntry::new(w.id.clone(), Position::new(x, y, half, h))
        })
        .collect()
}

/// The widget's own height, or the type's default footprint when unsized.
pub fn widget_height(widget: &WidgetInstance, registry: &WidgetRegistry) -> u32 {
    if widget.position.h >= 1 {
        return widget.position.h;
    }
    registry
        .default_footprint(&widget.type_id)
        .map(|f| f.h)
        .unwrap_or(1)
        .max(1)
}

/// Fit a rectangle inside the grid: spans shrink to the available columns and
/// an out-of-range column is pulled back to the last column. Rows are capped
/// at `MAX_ROWS`.
pub fn clamp_position(position: Position, columns: u32) -> Position {
    let columns = columns.max(1);
    let x = position.x.min(columns - 1);
    let w = position.w.max(1).min(columns - x);
    let h = position.h.clamp(1, MAX_ROWS);
    let y = position.y.min(MAX_ROWS - h);
    Position::new(x, y, w, h)
}

/// First free row below every widget in Grid placement.
pub fn grid_bottom(widgets: &[WidgetInstance]) -> u32 {
    widgets
        .iter()
        .map(|w| w.position.bottom())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget(id: &str, position: Position) -> WidgetInstance {
        WidgetInstance {
            id: id.into(),
            type_id: "taskList".into(),
            title: id.into(),
            config: json!({}),
            position,
        }
    }

    fn sample() -> Vec<WidgetInstance> {
        vec![
            widget("a", Position::new(0, 0, 4, 2)),
            widget("b", Position::new(4, 0, 8, 3)),
            widget("c", Position::new(0, 2, 6, 5)),
            widget("d", Position::new(6, 3, 6, 1)),
        ]
    }

    #[test]
    fn grid_mode_returns_positions_verbatim() {
        let reg = WidgetRegistry::with_defaults();
        let widgets = sample();
        let layout = compute_layout(LayoutMode::Grid, &widgets, &reg);
        for (w, e) in widgets.iter().zip(&layout) {
            assert_eq!(e.instance_id, w.id);
            assert_eq!(e.position(), w.position);
        }
    }

    #[test]
    fn list_mode_stacks_full_width() {
        let reg = WidgetRegistry::with_defaults();
        let layout = compute_layout(LayoutMode::List, &sample(), &reg);
        let ys: Vec<u32> = layout.iter().map(|e| e.y).collect();
        assert_eq!(ys, vec![0, 2, 5, 10]);
        assert!(layout.iter().all(|e| e.x == 0 && e.w == 12));
    }

    #[test]
    fn compact_mode_alternates_columns() {
        let reg = WidgetRegistry::with_defaults();
        let layout = compute_layout(LayoutMode::Compact, &sample(), &reg);
        let placed: Vec<(u32, u32, u32)> = layout.iter().map(|e| (e.x, e.y, e.w)).collect();
        assert_eq!(placed, vec![(0, 0, 6), (6, 0, 6), (0, 2, 6), (6, 3, 6)]);
    }

    #[test]
    fn unsized_widget_falls_back_to_type_footprint() {
        let reg = WidgetRegistry::with_defaults();
        let w = widget("a", Position::new(0, 0, 0, 0));
        assert_eq!(widget_height(&w, &reg), 4);
    }

    #[test]
    fn clamps_out_of_bounds() {
        assert_eq!(
            clamp_position(Position::new(10, 1, 6, 2), 12),
            Position::new(10, 1, 2, 2)
        );
        assert_eq!(
            clamp_position(Position::new(40, 0, 3, 0), 12),
            Position::new(11, 0, 1, 1)
        );
    }

    #[test]
    fn narrow_breakpoints_scale_each_mode() {
        let reg = WidgetRegistry::with_defaults();
        let cols = Breakpoint::Sm.columns();
        let grid = compute_layout_for(LayoutMode::Grid, &sample(), &reg, cols);
        assert!(grid.iter().all(|e| e.x + e.w <= cols));
        let compact = compute_layout_for(LayoutMode::Compact, &sample(), &reg, cols);
        assert_eq!(compact[1].x, 3);
        let single = compute_layout_for(LayoutMode::Compact, &sample(), &reg, 1);
        assert!(single.iter().all(|e| e.x == 0 && e.w == 1));
    }

    #[test]
    fn breakpoint_for_width() {
        assert_eq!(Breakpoint::for_width(1400), Breakpoint::Lg);
        assert_eq!(Breakpoint::for_width(800), Breakpoint::Sm);
        assert_eq!(Breakpoint::for_width(100), Breakpoint::Xxs);
    }
}
