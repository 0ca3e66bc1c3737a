pub mod bus;
pub mod drawer;
pub mod storage;
pub mod widgets;
pub mod workspaces;

pub use bus::{EventBus, HandlerId};
pub use drawer::DrawerManager;
pub use storage::{JsonFileStore, MemoryStore, Persister, WorkspaceStore};
pub use widgets::WidgetManager;
pub use workspaces::{AutoSaver, WorkspaceManager};
