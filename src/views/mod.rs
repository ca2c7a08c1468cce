pub mod bar_ui;
pub mod canvas;
pub mod network_ui;
pub mod registry;
pub mod scatter_ui;
pub mod transition;
pub mod view_trait;

pub use bar_ui::BarView;
pub use canvas::PointStyle;
pub use network_ui::NetworkView;
pub use registry::ViewRegistry;
pub use scatter_ui::ScatterView;
pub use view_trait::{View, ViewKind, ViewUpdate};
