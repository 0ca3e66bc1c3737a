pub mod apps;
pub mod config;
pub mod context;
pub mod widget_view;

pub use apps::AppUiController;
pub use config::ShellConfig;
pub use context::ShellContext;
pub use widget_view::{Gesture, WidgetChrome, WidgetState, WidgetUiController, WidgetView};
