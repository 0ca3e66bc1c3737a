//! Sample catalogs, workspaces and pre-seeded stores.

use std::sync::Arc;

use gridshell_core::{MemoryStore, WorkspaceStore};
use gridshell_types::{
    AppDefinition, Catalog, CellIndex, CellSize, ConfigMap, DisplayMode, GestureAction,
    GestureBindings, HeaderPolicy, WidgetDefinition, WidgetInstance, Workspace,
    WorkspaceId,
};

/// A small catalog covering the interesting shapes: a launcher, a one-row
/// widget, multi-row widgets, a single-instance fullscreen app and a
/// multi-instance app.
pub fn sample_catalog() -> Catalog {
    let widgets = vec![
        WidgetDefinition {
            id: "clock".to_string(),
            kind: "clock".to_string(),
            name: "Clock".to_string(),
            icon: "clock".to_string(),
            category: "info".to_string(),
            size: CellSize::new(2, 1),
            description: "Current time".to_string(),
            default_config: config(&[("format", "24h")]),
            app_id: None,
            header: HeaderPolicy::Auto,
            gestures: GestureBindings::default(),
        },
        WidgetDefinition {
            id: "notes".to_string(),
            kind: "notes".to_string(),
            name: "Notes".to_string(),
            icon: "note".to_string(),
            category: "productivity".to_string(),
            size: CellSize::new(2, 2),
            description: "Scratchpad".to_string(),
            default_config: ConfigMap::new(),
            app_id: Some("notebook".to_string()),
            header: HeaderPolicy::Auto,
            gestures: GestureBindings {
                double_tap: GestureAction::OpenApp("notebook".to_string()),
                long_press: GestureAction::RemoveWidget,
            },
        },
        WidgetDefinition {
            id: "weather".to_string(),
            kind: "weather".to_string(),
            name: "Weather".to_string(),
            icon: "cloud".to_string(),
            category: "info".to_string(),
            size: CellSize::new(2, 2),
            description: "Local forecast".to_string(),
            default_config: config(&[("unit", "celsius")]),
            app_id: None,
            header: HeaderPolicy::Always,
            gestures: GestureBindings::default(),
        },
        WidgetDefinition {
            id: "notebook-shortcut".to_string(),
            kind: "shortcut".to_string(),
            name: "Notebook".to_string(),
            icon: "note".to_string(),
            category: "productivity".to_string(),
            size: CellSize::new(1, 1),
            description: "Open the notebook".to_string(),
            default_config: ConfigMap::new(),
            app_id: Some("notebook".to_string()),
            header: HeaderPolicy::Never,
            gestures: GestureBindings {
                double_tap: GestureAction::None,
                long_press: GestureAction::RemoveWidget,
            },
        },
    ];
    let apps = vec![
        AppDefinition {
            id: "notebook".to_string(),
            name: "Notebook".to_string(),
            icon: "note".to_string(),
            category: "productivity".to_string(),
            display_mode: DisplayMode::Fullscreen,
            single_instance: true,
            description: "Long-form notes".to_string(),
            default_settings: config(&[("theme", "light")]),
        },
        AppDefinition {
            id: "player".to_string(),
            name: "Player".to_string(),
            icon: "music".to_string(),
            category: "media".to_string(),
            display_mode: DisplayMode::FullscreenNoDock,
            single_instance: false,
            description: "Media playback".to_string(),
            default_settings: ConfigMap::new(),
        },
        AppDefinition {
            id: "settings".to_string(),
            name: "Settings".to_string(),
            icon: "gear".to_string(),
            category: "system".to_string(),
            display_mode: DisplayMode::Popup,
            single_instance: true,
            description: "Shell preferences".to_string(),
            default_settings: ConfigMap::new(),
        },
    ];
    Catalog::new(widgets, apps)
}

/// Build a config map from string pairs.
pub fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect()
}

/// Instantiate a catalog widget at a cell, same as a drop would.
pub fn instance_at(catalog: &Catalog, definition_id: &str, cell: CellIndex) -> WidgetInstance {
    let definition = catalog
        .widget(definition_id)
        .unwrap_or_else(|| panic!("fixture catalog has no widget {definition_id}"));
    WidgetInstance::from_definition(definition, cell)
}

/// A workspace owned by the fixture user, pre-populated with widgets.
pub fn workspace_with(id: &str, name: &str, widgets: Vec<WidgetInstance>) -> Workspace {
    let mut workspace = Workspace::new(WorkspaceId::new(id), name.to_string(), "tester".to_string());
    workspace.widgets = widgets;
    workspace
}

/// An in-memory store pre-seeded with workspaces; the first one is marked
/// current.
pub fn seeded_store(workspaces: Vec<Workspace>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (index, workspace) in workspaces.into_iter().enumerate() {
        if index == 0 {
            store
                .save_current_workspace_id(&workspace.id)
                .unwrap_or_else(|e| panic!("seeding current workspace id: {e}"));
        }
        store
            .save_workspace(&workspace)
            .unwrap_or_else(|e| panic!("seeding workspace: {e}"));
    }
    store
}
