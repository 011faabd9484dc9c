pub mod backend;
pub mod codec;
pub mod config;
pub mod layout;
pub mod model;
pub mod persistence;
pub mod runtime;
pub mod store;
pub mod widgets;

pub use backend::{DashboardBackend, EntityOption, EntitySource, FileBackend, HttpBackend, MemoryBackend};
pub use codec::{DashboardDocument, ImportError};
pub use layout::{compute_layout, Breakpoint};
pub use model::{DashboardState, LayoutEntry, LayoutMode, Position, Role, Theme, WidgetInstance};
pub use persistence::{PersistenceConfig, PersistenceController, PersistenceNotice, SaveLifecycle};
pub use runtime::{DashboardRuntime, FrameBody, WidgetFrame};
pub use store::{ConfigUpdate, DashboardStore, StoreError, WidgetOverrides};
pub use widgets::{WidgetFactory, WidgetRegistry};
